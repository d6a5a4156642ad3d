use crate::app_config::{AppConfig, Environment};
use crate::place::Category;
use crate::ConfigError;

/// Yelp caps `limit` at 50 results per request.
const MAX_SEARCH_LIMIT: u32 = 50;

/// Yelp caps `radius` at 40 km.
const MAX_SEARCH_RADIUS_METERS: u32 = 40_000;

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
/// Decoupled from the real environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32_in = |var: &str, default: &str, max: u32| -> Result<u32, ConfigError> {
        let value = or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 || value > max {
            return Err(invalid(var, format!("must be between 1 and {max}")));
        }
        Ok(value)
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let yelp_api_key = require("YELP_API_KEY")?;

    let env = parse_environment(&or_default("FASTFOODZ_ENV", "development"));
    let log_level = or_default("FASTFOODZ_LOG_LEVEL", "info");
    let yelp_base_url = or_default("FASTFOODZ_YELP_BASE_URL", "https://api.yelp.com/");

    let search_limit = parse_u32_in("FASTFOODZ_SEARCH_LIMIT", "20", MAX_SEARCH_LIMIT)?;
    let search_radius_meters = parse_u32_in(
        "FASTFOODZ_SEARCH_RADIUS_METERS",
        "1000",
        MAX_SEARCH_RADIUS_METERS,
    )?;
    let search_categories = parse_categories(&or_default(
        "FASTFOODZ_SEARCH_CATEGORIES",
        "pizza,mexican,chinese,burgers",
    ))
    .map_err(|reason| invalid("FASTFOODZ_SEARCH_CATEGORIES", reason))?;

    let request_timeout_secs = parse_u64("FASTFOODZ_REQUEST_TIMEOUT_SECS", "10")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "FASTFOODZ_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let cache_ttl_secs = match lookup("FASTFOODZ_CACHE_TTL_SECS") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid("FASTFOODZ_CACHE_TTL_SECS", e.to_string()))?,
        ),
        _ => None,
    };

    let user_agent = or_default("FASTFOODZ_USER_AGENT", "fastfoodz/0.1 (nearby-places)");

    Ok(AppConfig {
        env,
        log_level,
        yelp_api_key,
        yelp_base_url,
        search_limit,
        search_radius_meters,
        search_categories,
        request_timeout_secs,
        cache_ttl_secs,
        user_agent,
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

/// Parses a comma-separated list of category aliases. Blank entries are
/// ignored; duplicates collapse to their first occurrence.
///
/// # Errors
///
/// Returns a reason string if an alias is outside the fixed category set or
/// the list is empty.
pub fn parse_categories(raw: &str) -> Result<Vec<Category>, String> {
    let mut categories = Vec::new();
    for alias in raw.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        let category = Category::from_alias(alias)
            .ok_or_else(|| format!("unsupported category '{alias}'"))?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    if categories.is_empty() {
        return Err("at least one category is required".to_string());
    }
    Ok(categories)
}
