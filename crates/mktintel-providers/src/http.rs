//! Shared request plumbing for the HTTP adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

const USER_AGENT: &str = "mktintel/0.1 (marketing-intelligence)";

/// Longest error body kept in [`ProviderError::Api`] messages.
const MAX_ERROR_BODY: usize = 300;

pub(crate) fn build_client(provider: &str, timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| ProviderError::Http {
            provider: provider.to_string(),
            source,
        })
}

/// Normalise a base URL so path segments can be appended with `/`.
pub(crate) fn normalise_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Send `request`, reject non-2xx statuses and decode the body as JSON.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    timeout: Duration,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, timeout_ms, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, timeout_ms, e))?;

    if !status.is_success() {
        return Err(ProviderError::Api {
            provider: provider.to_string(),
            status: status.as_u16(),
            message: truncate(&body, MAX_ERROR_BODY).to_string(),
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::malformed(provider, e.to_string()))
}

fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}
