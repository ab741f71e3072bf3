use crate::app_config::{AppConfig, DedupConfig, DedupStrategy, Environment};
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
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    macro_rules! parse_num {
        ($var:expr, $default:expr, $ty:ty) => {{
            let raw = or_default($var, $default);
            raw.parse::<$ty>().map_err(|e| ConfigError::InvalidEnvVar {
                var: $var.to_string(),
                reason: e.to_string(),
            })
        }};
    }

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("NASOL_ENV", "development"))?;

    let bind_raw = or_default("NASOL_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "NASOL_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let log_level = or_default("NASOL_LOG_LEVEL", "info");
    let program_path = PathBuf::from(or_default("NASOL_PROGRAM_PATH", "./config/program.yaml"));

    let db_max_connections = parse_num!("NASOL_DB_MAX_CONNECTIONS", "10", u32)?;
    let db_min_connections = parse_num!("NASOL_DB_MIN_CONNECTIONS", "1", u32)?;
    let db_acquire_timeout_secs = parse_num!("NASOL_DB_ACQUIRE_TIMEOUT_SECS", "10", u64)?;

    let naver_client_id = optional("NAVER_CLIENT_ID");
    let naver_client_secret = optional("NAVER_CLIENT_SECRET");
    let search_base_url = or_default("NASOL_SEARCH_BASE_URL", "https://openapi.naver.com");

    let service_key = optional("NASOL_SERVICE_KEY");
    let enrich_endpoint = optional("NASOL_ENRICH_ENDPOINT").unwrap_or_else(|| {
        format!(
            "http://127.0.0.1:{}/functions/v1/enrich-thumbnails",
            bind_addr.port()
        )
    });

    let hf_api_token = optional("HF_API_TOKEN");
    let embedding_base_url = or_default(
        "NASOL_EMBEDDING_BASE_URL",
        "https://api-inference.huggingface.co",
    );
    let embedding_timeout_secs = parse_num!("NASOL_EMBEDDING_TIMEOUT_SECS", "30", u64)?;
    let thumbnail_timeout_secs = parse_num!("NASOL_THUMBNAIL_TIMEOUT_SECS", "10", u64)?;

    let dedup = build_dedup_config(&lookup)?;

    let collect_cron = or_default("NASOL_COLLECT_CRON", "0 0 * * * *");
    let require_function_auth = parse_bool(
        "NASOL_REQUIRE_FUNCTION_AUTH",
        &or_default("NASOL_REQUIRE_FUNCTION_AUTH", "false"),
    )?;
    if require_function_auth && service_key.is_none() {
        return Err(ConfigError::MissingEnvVar("NASOL_SERVICE_KEY".to_string()));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        program_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        naver_client_id,
        naver_client_secret,
        search_base_url,
        service_key,
        enrich_endpoint,
        hf_api_token,
        embedding_base_url,
        embedding_timeout_secs,
        thumbnail_timeout_secs,
        dedup,
        collect_cron,
        require_function_auth,
    })
}

fn build_dedup_config<F>(lookup: &F) -> Result<DedupConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = DedupConfig::default();
    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let strategy = match lookup("NASOL_DEDUP_STRATEGY") {
        Ok(raw) => raw
            .parse::<DedupStrategy>()
            .map_err(|reason| invalid("NASOL_DEDUP_STRATEGY", reason))?,
        Err(_) => defaults.strategy,
    };

    let similarity_threshold = match lookup("NASOL_SIMILARITY_THRESHOLD") {
        Ok(raw) => raw
            .parse::<f32>()
            .map_err(|e| invalid("NASOL_SIMILARITY_THRESHOLD", e.to_string()))?,
        Err(_) => defaults.similarity_threshold,
    };
    if !(0.0..=1.0).contains(&similarity_threshold) {
        return Err(invalid(
            "NASOL_SIMILARITY_THRESHOLD",
            format!("{similarity_threshold} is outside [0, 1]"),
        ));
    }

    let window_hours = match lookup("NASOL_DEDUP_WINDOW_HOURS") {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|e| invalid("NASOL_DEDUP_WINDOW_HOURS", e.to_string()))?,
        Err(_) => defaults.window_hours,
    };

    let window_limit = match lookup("NASOL_DEDUP_WINDOW_LIMIT") {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|e| invalid("NASOL_DEDUP_WINDOW_LIMIT", e.to_string()))?,
        Err(_) => defaults.window_limit,
    };
    if window_hours <= 0 || window_limit <= 0 {
        return Err(invalid(
            "NASOL_DEDUP_WINDOW_LIMIT",
            "dedup window hours and limit must be positive".to_string(),
        ));
    }

    let embedding_models = match lookup("NASOL_EMBEDDING_MODELS") {
        Ok(raw) => {
            let models: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect();
            if models.is_empty() {
                return Err(invalid(
                    "NASOL_EMBEDDING_MODELS",
                    "at least one model id is required".to_string(),
                ));
            }
            models
        }
        Err(_) => defaults.embedding_models,
    };

    Ok(DedupConfig {
        strategy,
        window_hours,
        window_limit,
        similarity_threshold,
        embedding_models,
        ..defaults
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NASOL_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("'{other}' is not a boolean"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
