use std::str::FromStr;

use rust_decimal::Decimal;

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
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; `SERPAPI_KEY` and `DEALFINDER_RETAILERS_PATH`
/// are optional and stay `None` when unset.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let env = parse_environment(&or_default("DEALFINDER_ENV", "development"))?;

    let bind_addr = or_default("DEALFINDER_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("DEALFINDER_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("DEALFINDER_LOG_LEVEL", "info");

    let serpapi_api_key = optional("SERPAPI_KEY");
    let serpapi_base_url = or_default("DEALFINDER_SERPAPI_BASE_URL", "https://serpapi.com/");
    let retailers_path = optional("DEALFINDER_RETAILERS_PATH").map(PathBuf::from);

    let request_timeout_secs = parse_u64("DEALFINDER_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("DEALFINDER_USER_AGENT", "dealfinder/0.1 (price-comparison)");
    let results_per_retailer = parse_u32("DEALFINDER_RESULTS_PER_RETAILER", "15")?;
    let enrichment_results = parse_u32("DEALFINDER_ENRICHMENT_RESULTS", "20")?;
    let enrichment_enabled = parse_bool("DEALFINDER_ENRICHMENT_ENABLED", "true")?;
    let fuzzy_title_match = parse_bool("DEALFINDER_FUZZY_TITLE_MATCH", "false")?;
    let price_max = parse_price_max(&or_default("DEALFINDER_PRICE_MAX", "100000"))?;

    let free_daily_searches = parse_u32("DEALFINDER_FREE_DAILY_SEARCHES", "2")?;
    let premium_daily_searches = parse_u32("DEALFINDER_PREMIUM_DAILY_SEARCHES", "20")?;
    let rate_limit_per_minute = parse_usize("DEALFINDER_RATE_LIMIT_PER_MINUTE", "120")?;

    if results_per_retailer == 0 {
        return Err(invalid(
            "DEALFINDER_RESULTS_PER_RETAILER",
            "must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        serpapi_api_key,
        serpapi_base_url,
        retailers_path,
        request_timeout_secs,
        user_agent,
        results_per_retailer,
        enrichment_results,
        enrichment_enabled,
        fuzzy_title_match,
        price_max,
        free_daily_searches,
        premium_daily_searches,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DEALFINDER_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_price_max(raw: &str) -> Result<Decimal, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "DEALFINDER_PRICE_MAX".to_string(),
        reason,
    };
    let value = Decimal::from_str(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if value <= Decimal::ZERO {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
