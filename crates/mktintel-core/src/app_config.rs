use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// When unset the engine runs with the in-memory cache store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub apify_api_token: Option<String>,
    pub apify_base_url: String,
    pub tavily_api_key: Option<String>,
    pub tavily_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub provider_timeout_secs: u64,
    pub request_deadline_secs: u64,
    pub scoring_concurrency: usize,
    pub stream_pacing_ms: u64,
    pub keywords_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "apify_api_token",
                &self.apify_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("apify_base_url", &self.apify_base_url)
            .field(
                "tavily_api_key",
                &self.tavily_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("tavily_base_url", &self.tavily_base_url)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("request_deadline_secs", &self.request_deadline_secs)
            .field("scoring_concurrency", &self.scoring_concurrency)
            .field("stream_pacing_ms", &self.stream_pacing_ms)
            .field("keywords_path", &self.keywords_path)
            .finish()
    }
}
