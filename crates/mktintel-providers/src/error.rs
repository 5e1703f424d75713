use thiserror::Error;

/// Errors returned by provider adapters.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The call did not finish within its time budget.
    #[error("{provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("{provider} HTTP error: {source}")]
    Http {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-2xx status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// The body could not be decoded into the expected shape.
    #[error("malformed response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },

    /// The adapter cannot serve this request (e.g. platform not covered).
    #[error("{provider} does not support {what}")]
    Unsupported { provider: String, what: String },
}

impl ProviderError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }

    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, ProviderError::MalformedResponse { .. })
    }

    /// Name of the provider that produced the error.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Timeout { provider, .. }
            | ProviderError::Http { provider, .. }
            | ProviderError::Api { provider, .. }
            | ProviderError::MalformedResponse { provider, .. }
            | ProviderError::Unsupported { provider, .. } => provider,
        }
    }

    pub(crate) fn from_reqwest(provider: &str, timeout_ms: u64, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ProviderError::Timeout {
                provider: provider.to_string(),
                timeout_ms,
            }
        } else {
            ProviderError::Http {
                provider: provider.to_string(),
                source,
            }
        }
    }

    pub(crate) fn malformed(provider: &str, reason: impl Into<String>) -> Self {
        ProviderError::MalformedResponse {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}
