//! Process setup: logging, profile loading and engine wiring.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use mktintel_core::{AppConfig, BusinessContext, KeywordTable};
use mktintel_db::{CacheStore, MemoryCacheStore, PgCacheStore};
use mktintel_discovery::{DiscoveryEngine, EngineSettings, ProviderSet};
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` wins over the
/// configured level.
pub(crate) fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a YAML business profile from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid profile.
pub(crate) fn load_profile(path: &Path) -> anyhow::Result<BusinessContext> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    parse_profile(&raw).with_context(|| format!("invalid profile {}", path.display()))
}

pub(crate) fn parse_profile(raw: &str) -> anyhow::Result<BusinessContext> {
    let context: BusinessContext = serde_yaml::from_str(raw)?;
    if context.company_name.trim().is_empty() {
        anyhow::bail!("company_name must not be empty");
    }
    Ok(context)
}

/// Build the engine: PostgreSQL cache when `DATABASE_URL` is set, in-memory
/// otherwise, and one provider per configured credential.
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail, the
/// keywords file is invalid or an HTTP client cannot be built.
pub(crate) async fn build_engine(config: &AppConfig) -> anyhow::Result<DiscoveryEngine> {
    let cache: Arc<dyn CacheStore> = if config.database_url.is_some() {
        let pool = mktintel_db::connect_pool_from_config(config).await?;
        let applied = mktintel_db::run_migrations(&pool).await?;
        tracing::info!(applied, "database ready");
        Arc::new(PgCacheStore::new(pool))
    } else {
        tracing::info!("DATABASE_URL not set, using in-memory cache");
        Arc::new(MemoryCacheStore::new())
    };

    let keywords = match config.keywords_path.as_deref() {
        Some(path) => mktintel_core::load_keyword_table(path)?,
        None => KeywordTable::default(),
    };

    let providers = ProviderSet::from_app_config(config)?;
    tracing::debug!(?providers, "providers configured");

    Ok(DiscoveryEngine::new(
        providers,
        cache,
        keywords,
        EngineSettings::from_app_config(config),
    ))
}
