use thiserror::Error;

use crate::app_config::{AppConfig, CrawlerConfig, Environment, ExpiryConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(invalid(var, format!("expected true/false, got {other:?}"))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("HOTDEAL_ENV", "development"));

    let bind_addr = parse_addr("HOTDEAL_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("HOTDEAL_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("HOTDEAL_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("HOTDEAL_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("HOTDEAL_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let crawler_defaults = CrawlerConfig::default();
    let time_filter_hours = match lookup("HOTDEAL_CRAWLER_TIME_FILTER_HOURS") {
        Ok(raw) => Some(raw.parse::<i64>().map_err(|e| {
            invalid("HOTDEAL_CRAWLER_TIME_FILTER_HOURS", e.to_string())
        })?),
        Err(_) => None,
    };
    let crawler = CrawlerConfig {
        headless: parse_bool("HOTDEAL_CRAWLER_HEADLESS", "true")?,
        max_pages: parse_u32("HOTDEAL_CRAWLER_MAX_PAGES", "2")?,
        page_delay_ms: parse_u64("HOTDEAL_CRAWLER_PAGE_DELAY_MS", "3000")?,
        navigation_timeout_secs: parse_u64("HOTDEAL_CRAWLER_NAV_TIMEOUT_SECS", "60")?,
        time_filter_hours,
        user_agent: or_default("HOTDEAL_CRAWLER_USER_AGENT", &crawler_defaults.user_agent),
        fetch_details: parse_bool("HOTDEAL_CRAWLER_FETCH_DETAILS", "false")?,
    };

    let expiry = ExpiryConfig {
        batch_size: parse_u64("HOTDEAL_EXPIRY_BATCH_SIZE", "500")?,
        warning_hours: parse_i64("HOTDEAL_EXPIRY_WARNING_HOURS", "24")?,
        dry_run: false,
        batch_pause_ms: parse_u64("HOTDEAL_EXPIRY_BATCH_PAUSE_MS", "100")?,
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        crawler,
        expiry,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
