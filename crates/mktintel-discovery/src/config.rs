//! Engine construction inputs: provider wiring and timing limits.

use std::sync::Arc;
use std::time::Duration;

use mktintel_core::AppConfig;
use mktintel_providers::{
    ApifyClient, OpenAiClient, PostFetcher, ProfileDiscovery, ProviderError, TavilyClient,
    TextGenerator, WebSearch,
};

/// The providers available to one engine. A missing capability makes the
/// corresponding fallback tier fail with "not configured".
#[derive(Clone, Default)]
pub struct ProviderSet {
    pub profiles: Option<Arc<dyn ProfileDiscovery>>,
    pub posts: Option<Arc<dyn PostFetcher>>,
    pub search: Option<Arc<dyn WebSearch>>,
    pub generator: Option<Arc<dyn TextGenerator>>,
}

impl ProviderSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_profiles(mut self, provider: Arc<dyn ProfileDiscovery>) -> Self {
        self.profiles = Some(provider);
        self
    }

    #[must_use]
    pub fn with_posts(mut self, provider: Arc<dyn PostFetcher>) -> Self {
        self.posts = Some(provider);
        self
    }

    #[must_use]
    pub fn with_search(mut self, provider: Arc<dyn WebSearch>) -> Self {
        self.search = Some(provider);
        self
    }

    #[must_use]
    pub fn with_generator(mut self, provider: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(provider);
        self
    }

    /// Build the HTTP-backed providers for every credential present in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if an HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(config.provider_timeout_secs);
        let mut set = Self::new();

        if let Some(token) = config.apify_api_token.as_deref() {
            let apify = Arc::new(ApifyClient::with_base_url(
                token,
                timeout,
                &config.apify_base_url,
            )?);
            set = set.with_profiles(apify.clone()).with_posts(apify);
        }
        if let Some(key) = config.tavily_api_key.as_deref() {
            set = set.with_search(Arc::new(TavilyClient::with_base_url(
                key,
                timeout,
                &config.tavily_base_url,
            )?));
        }
        if let Some(key) = config.openai_api_key.as_deref() {
            set = set.with_generator(Arc::new(OpenAiClient::with_base_url(
                key,
                &config.openai_model,
                timeout,
                &config.openai_base_url,
            )?));
        }

        Ok(set)
    }
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("profiles", &self.profiles.as_ref().map(|p| p.name().to_string()))
            .field("posts", &self.posts.as_ref().map(|p| p.name().to_string()))
            .field("search", &self.search.as_ref().map(|p| p.name().to_string()))
            .field(
                "generator",
                &self.generator.as_ref().map(|p| p.name().to_string()),
            )
            .finish()
    }
}

/// Timing and concurrency limits for one engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Upper bound for any single provider call.
    pub provider_timeout: Duration,
    /// Upper bound for a whole `discover`/`stream` request.
    pub request_deadline: Duration,
    pub scoring_concurrency: usize,
    /// Delay between items when replaying a cached entry as a stream.
    pub stream_pacing: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(20),
            request_deadline: Duration::from_secs(90),
            scoring_concurrency: 4,
            stream_pacing: Duration::from_millis(150),
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            provider_timeout: Duration::from_secs(config.provider_timeout_secs),
            request_deadline: Duration::from_secs(config.request_deadline_secs),
            scoring_concurrency: config.scoring_concurrency.max(1),
            stream_pacing: Duration::from_millis(config.stream_pacing_ms),
        }
    }
}
