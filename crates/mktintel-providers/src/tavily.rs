//! Web search through the Tavily API.

use std::time::Duration;

use async_trait::async_trait;
use mktintel_core::SearchResult;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{build_client, normalise_base_url, send_json};
use crate::timeout::bounded;
use crate::traits::WebSearch;

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
const PROVIDER: &str = "tavily";

pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilyClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, timeout, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(PROVIDER, timeout)?,
            api_key: api_key.to_owned(),
            base_url: normalise_base_url(base_url),
            timeout,
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ProviderError> {
        let body = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: limit,
            search_depth: "basic",
        };
        let request = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body);

        let response: SearchResponse = send_json(PROVIDER, self.timeout, request).await?;

        Ok(response
            .results
            .into_iter()
            .filter(|r| !r.url.trim().is_empty())
            .take(limit)
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search_web(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ProviderError> {
        let results = bounded(PROVIDER, self.timeout, self.search(query, limit)).await?;
        tracing::debug!(query, count = results.len(), "tavily search finished");
        Ok(results)
    }
}
