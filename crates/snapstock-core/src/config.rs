use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

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

/// Load application configuration from environment variables already in the
/// process. Does NOT load `.env` files — useful for testing or when the
/// caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup
/// function. The parsing/validation logic is decoupled from the process
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
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

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SNAPSTOCK_ENV", "development"));

    let bind_addr = parse_addr("SNAPSTOCK_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SNAPSTOCK_LOG_LEVEL", "info");

    let gemini_api_key = lookup("GOOGLE_GENERATIVE_AI_API_KEY").ok();
    let gemini_base_url = or_default(
        "SNAPSTOCK_GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com",
    );
    let vision_api_key = lookup("GOOGLE_VISION_API_KEY").ok();
    let vision_base_url = or_default(
        "SNAPSTOCK_VISION_BASE_URL",
        "https://vision.googleapis.com",
    );

    let shopify_api_version = or_default("SNAPSTOCK_SHOPIFY_API_VERSION", "2024-10");

    let db_max_connections = parse_u32("SNAPSTOCK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SNAPSTOCK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SNAPSTOCK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let platform_request_timeout_secs = parse_u64("SNAPSTOCK_PLATFORM_TIMEOUT_SECS", "30")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        gemini_api_key,
        gemini_base_url,
        vision_api_key,
        vision_base_url,
        shopify_api_version,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        platform_request_timeout_secs,
    })
}

fn parse_environment(raw: &str) -> Environment {
    match raw.to_ascii_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
