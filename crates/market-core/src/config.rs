use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Upper bound for `MARKET_SESSION_TTL_HOURS` (ten years).
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

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
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let narrow = |var: &str, value: u64| -> Result<u32, ConfigError> {
        u32::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let stripe_secret_key = require("STRIPE_SECRET_KEY")?;
    let stripe_publishable_key = require("STRIPE_PUBLISHABLE_KEY")?;
    let password_pepper = require("MARKET_PASSWORD_PEPPER")?;

    let env = parse_environment(&or_default("MARKET_ENV", "development"))?;

    let bind_raw = or_default("MARKET_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "MARKET_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;
    let log_level = or_default("MARKET_LOG_LEVEL", "info");

    let public_base_url = parse_base_url(
        "MARKET_PUBLIC_BASE_URL",
        &or_default("MARKET_PUBLIC_BASE_URL", "http://localhost:3000"),
    )?;
    let currency = parse_currency(&or_default("MARKET_CURRENCY", "usd"))?;

    let session_ttl_hours = parse_num("MARKET_SESSION_TTL_HOURS", "336")?;
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
        return Err(ConfigError::InvalidEnvVar {
            var: "MARKET_SESSION_TTL_HOURS".to_string(),
            reason: format!("must be between 1 and {MAX_SESSION_TTL_HOURS}"),
        });
    }
    let session_ttl_hours =
        i64::try_from(session_ttl_hours).map_err(|e| ConfigError::InvalidEnvVar {
            var: "MARKET_SESSION_TTL_HOURS".to_string(),
            reason: e.to_string(),
        })?;
    let rate_limit_per_minute =
        usize::try_from(parse_num("MARKET_RATE_LIMIT_PER_MINUTE", "120")?).map_err(|e| {
            ConfigError::InvalidEnvVar {
                var: "MARKET_RATE_LIMIT_PER_MINUTE".to_string(),
                reason: e.to_string(),
            }
        })?;

    let db_max_connections = narrow(
        "MARKET_DB_MAX_CONNECTIONS",
        parse_num("MARKET_DB_MAX_CONNECTIONS", "10")?,
    )?;
    let db_min_connections = narrow(
        "MARKET_DB_MIN_CONNECTIONS",
        parse_num("MARKET_DB_MIN_CONNECTIONS", "1")?,
    )?;
    let db_acquire_timeout_secs = parse_num("MARKET_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let stripe_api_base = parse_base_url(
        "STRIPE_API_BASE",
        &or_default("STRIPE_API_BASE", "https://api.stripe.com/"),
    )?;
    let stripe_request_timeout_secs = parse_num("STRIPE_REQUEST_TIMEOUT_SECS", "30")?;
    let stripe_max_retries = narrow("STRIPE_MAX_RETRIES", parse_num("STRIPE_MAX_RETRIES", "2")?)?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        public_base_url,
        currency,
        password_pepper,
        session_ttl_hours,
        rate_limit_per_minute,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        stripe_secret_key,
        stripe_publishable_key,
        stripe_api_base,
        stripe_request_timeout_secs,
        stripe_max_retries,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MARKET_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

/// Accepts `http://` or `https://` origins and strips any trailing slash.
fn parse_base_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_currency(raw: &str) -> Result<String, ConfigError> {
    let code = raw.trim().to_ascii_lowercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_lowercase()) {
        Ok(code)
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: "MARKET_CURRENCY".to_string(),
            reason: format!("expected a three-letter currency code, got '{raw}'"),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
