use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("MKTINTEL_ENV", "development"))?;
    let log_level = or_default("MKTINTEL_LOG_LEVEL", "info");

    let database_url = optional("DATABASE_URL");
    let db_max_connections = parse_u32("MKTINTEL_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("MKTINTEL_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("MKTINTEL_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let apify_api_token = optional("APIFY_API_TOKEN");
    let apify_base_url = or_default("APIFY_BASE_URL", "https://api.apify.com/v2");
    let tavily_api_key = optional("TAVILY_API_KEY");
    let tavily_base_url = or_default("TAVILY_BASE_URL", "https://api.tavily.com");
    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_base_url = or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_model = or_default("OPENAI_MODEL", "gpt-4o-mini");

    let provider_timeout_secs = parse_u64("MKTINTEL_PROVIDER_TIMEOUT_SECS", "20")?;
    let request_deadline_secs = parse_u64("MKTINTEL_REQUEST_DEADLINE_SECS", "90")?;
    let scoring_concurrency = parse_usize("MKTINTEL_SCORING_CONCURRENCY", "4")?;
    let stream_pacing_ms = parse_u64("MKTINTEL_STREAM_PACING_MS", "150")?;
    let keywords_path = optional("MKTINTEL_KEYWORDS_PATH").map(PathBuf::from);

    if provider_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MKTINTEL_PROVIDER_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    if request_deadline_secs < provider_timeout_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "MKTINTEL_REQUEST_DEADLINE_SECS".to_string(),
            reason: format!(
                "must be at least the provider timeout ({provider_timeout_secs}s)"
            ),
        });
    }

    Ok(AppConfig {
        env,
        log_level,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        apify_api_token,
        apify_base_url,
        tavily_api_key,
        tavily_base_url,
        openai_api_key,
        openai_base_url,
        openai_model,
        provider_timeout_secs,
        request_deadline_secs,
        scoring_concurrency: scoring_concurrency.max(1),
        stream_pacing_ms,
        keywords_path,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MKTINTEL_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
