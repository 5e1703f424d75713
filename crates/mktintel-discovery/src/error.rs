use mktintel_core::ArtifactKind;
use mktintel_db::CacheError;
use mktintel_providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("{provider} timed out after {timeout_ms}ms")]
    ProviderTimeout { provider: String, timeout_ms: u64 },

    #[error(transparent)]
    Provider(ProviderError),

    #[error("malformed response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("no {kind} candidates found")]
    NoCandidatesFound { kind: ArtifactKind },

    #[error("no {capability} provider configured")]
    NotConfigured { capability: &'static str },

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<ProviderError> for DiscoveryError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Timeout {
                provider,
                timeout_ms,
            } => DiscoveryError::ProviderTimeout {
                provider,
                timeout_ms,
            },
            ProviderError::MalformedResponse { provider, reason } => {
                DiscoveryError::MalformedResponse { provider, reason }
            }
            other => DiscoveryError::Provider(other),
        }
    }
}

impl DiscoveryError {
    pub(crate) fn malformed(provider: &str, reason: impl Into<String>) -> Self {
        DiscoveryError::MalformedResponse {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}
