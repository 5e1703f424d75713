//! Capability traits. The engine only ever talks to providers through these.

use async_trait::async_trait;
use mktintel_core::{Candidate, Platform, Post, SearchResult};

use crate::error::ProviderError;

/// Finds social profiles (or companies) matching a keyword on one platform.
#[async_trait]
pub trait ProfileDiscovery: Send + Sync {
    fn name(&self) -> &str;

    async fn discover_profiles(
        &self,
        keyword: &str,
        platform: Platform,
        limit: usize,
    ) -> Result<Vec<Candidate>, ProviderError>;
}

/// Fetches the most recent posts of known accounts.
#[async_trait]
pub trait PostFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_recent_posts(
        &self,
        platform: Platform,
        handles: &[String],
        limit: usize,
    ) -> Result<Vec<Post>, ProviderError>;
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search_web(&self, query: &str, limit: usize)
        -> Result<Vec<SearchResult>, ProviderError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_text(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;
}
