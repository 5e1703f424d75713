//! Time bound applied to every provider call.

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

/// Run `call`, failing with [`ProviderError::Timeout`] if it does not finish
/// within `timeout`.
///
/// # Errors
///
/// Returns the call's own error, or [`ProviderError::Timeout`] on expiry.
pub async fn bounded<T, F>(provider: &str, timeout: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    if let Ok(result) = tokio::time::timeout(timeout, call).await {
        result
    } else {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(provider, timeout_ms, "provider call timed out");
        Err(ProviderError::Timeout {
            provider: provider.to_string(),
            timeout_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_results() {
        let result = bounded("fast", Duration::from_secs(1), async {
            Ok::<u32, ProviderError>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_call_becomes_timeout() {
        let result = bounded("slow", Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<u32, ProviderError>(1)
        })
        .await;
        match result {
            Err(ProviderError::Timeout {
                provider,
                timeout_ms,
            }) => {
                assert_eq!(provider, "slow");
                assert_eq!(timeout_ms, 50);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inner_errors_are_preserved() {
        let result = bounded("broken", Duration::from_secs(1), async {
            Err::<u32, _>(ProviderError::malformed("broken", "nope"))
        })
        .await;
        assert!(result.unwrap_err().is_malformed());
    }
}
