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
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

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

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SLADASH_ENV", "development"))?;

    let bind_addr = parse_addr("SLADASH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SLADASH_LOG_LEVEL", "info");

    let locations_path = PathBuf::from(or_default(
        "SLADASH_LOCATIONS_PATH",
        "./config/locations.csv",
    ));
    let stores_path = PathBuf::from(or_default("SLADASH_STORES_PATH", "./config/stores.csv"));
    let items_path = PathBuf::from(or_default("SLADASH_ITEMS_PATH", "./config/items.csv"));

    let api_base_url = or_default(
        "SLADASH_API_BASE_URL",
        "https://api.example-commerce.test",
    );
    let api_user_agent = or_default("SLADASH_API_USER_AGENT", "sladash/0.1 (sla-monitor)");
    let api_timeout_ms = parse_u64("SLADASH_API_TIMEOUT_MS", "10000")?;

    let batch_size = or_default("SLADASH_BATCH_SIZE", "50")
        .parse::<usize>()
        .map_err(|e| invalid("SLADASH_BATCH_SIZE", e.to_string()))?;
    if batch_size == 0 {
        return Err(invalid(
            "SLADASH_BATCH_SIZE",
            "batch size must be at least 1".to_string(),
        ));
    }
    let cooldown_ms = parse_u64("SLADASH_COOLDOWN_MS", "1000")?;

    let schedule_cron = or_default("SLADASH_SCHEDULE_CRON", "0 */15 * * * *");
    let scheduler_enabled = parse_bool("SLADASH_SCHEDULER_ENABLED", "true")?;

    let db_max_connections = parse_u32("SLADASH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SLADASH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SLADASH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let mut api_keys: Vec<String> = or_default("SLADASH_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    api_keys.sort_unstable();
    api_keys.dedup();
    let trigger_limit_per_minute = parse_u32("SLADASH_TRIGGER_LIMIT_PER_MINUTE", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        locations_path,
        stores_path,
        items_path,
        api_base_url,
        api_user_agent,
        api_timeout_ms,
        batch_size,
        cooldown_ms,
        schedule_cron,
        scheduler_enabled,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        api_keys,
        trigger_limit_per_minute,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SLADASH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
