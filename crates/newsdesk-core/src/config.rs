use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

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
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = or_default("DATABASE_URL", "sqlite://newsdesk.db");
    let env = parse_environment(&or_default("NEWSDESK_ENV", "development"))?;

    let bind_addr = or_default("NEWSDESK_BIND_ADDR", "127.0.0.1:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("NEWSDESK_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("NEWSDESK_LOG_LEVEL", "info");

    let shutdown_token = lookup("NEWSDESK_SHUTDOWN_TOKEN")
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    let source_base_url = or_default("NEWSDESK_SOURCE_BASE_URL", "https://www.theguardian.com")
        .trim_end_matches('/')
        .to_string();
    if !source_base_url.starts_with("http://") && !source_base_url.starts_with("https://") {
        return Err(invalid(
            "NEWSDESK_SOURCE_BASE_URL",
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    let section = or_default("NEWSDESK_SECTION", "world")
        .trim_matches('/')
        .to_string();
    if section.is_empty() || section.contains('/') {
        return Err(invalid(
            "NEWSDESK_SECTION",
            "must be a single path segment".to_string(),
        ));
    }

    let initial_pages = parse_u32("NEWSDESK_INITIAL_PAGES", "10")?;
    let pages_per_run = parse_u32("NEWSDESK_PAGES_PER_RUN", "1")?;
    let run_interval_minutes = parse_u64("NEWSDESK_RUN_INTERVAL_MINUTES", "60")?;
    if run_interval_minutes == 0 {
        return Err(invalid(
            "NEWSDESK_RUN_INTERVAL_MINUTES",
            "must be greater than zero".to_string(),
        ));
    }

    let db_max_connections = parse_u32("NEWSDESK_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("NEWSDESK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("NEWSDESK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "NEWSDESK_DB_MIN_CONNECTIONS",
            format!("{db_min_connections} exceeds NEWSDESK_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }

    let scraper_request_timeout_secs = parse_u64("NEWSDESK_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "NEWSDESK_SCRAPER_USER_AGENT",
        "newsdesk/0.1 (article-archive)",
    );

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        shutdown_token,
        source_base_url,
        section,
        initial_pages,
        pages_per_run,
        run_interval_minutes,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEWSDESK_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
