use crate::services::LookupKey;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub lookup: LookupSettings,
    /// Upper bound on releasing the connection pool at exit.
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// May embed credentials, so it is never logged.
    pub uri: Secret<String>,
    pub database: String,
    pub collection: String,
    pub max_pool_size: u32,
    /// Bounds both establishing connections and the startup ping.
    pub connect_timeout: Duration,
    /// How long an operation waits for a usable server before failing as
    /// unavailable. Kept below the lookup deadline.
    pub server_selection_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LookupSettings {
    /// Key served on `/`.
    pub default_key: LookupKey,
    /// Per-request deadline for the store lookup.
    pub timeout: Duration,
}

impl LookupConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let max_pool_size: u32 = get_parsed("MONGODB_MAX_POOL_SIZE", "300", is_prod)?;
        if max_pool_size == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MONGODB_MAX_POOL_SIZE must be at least 1"
            )));
        }

        let connect_timeout = Duration::from_secs(get_parsed(
            "MONGODB_CONNECT_TIMEOUT_SECS",
            "10",
            is_prod,
        )?);
        let lookup_timeout =
            Duration::from_secs(get_parsed("LOOKUP_TIMEOUT_SECS", "2", is_prod)?);
        if lookup_timeout.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LOOKUP_TIMEOUT_SECS must be at least 1"
            )));
        }

        Ok(LookupConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: Secret::new(get_env(
                    "MONGODB_URI",
                    Some("mongodb://mongodb:27017"),
                    is_prod,
                )?),
                database: get_env("MONGODB_DATABASE", Some("demo"), is_prod)?,
                collection: get_env("MONGODB_COLLECTION", Some("test"), is_prod)?,
                max_pool_size,
                connect_timeout,
                server_selection_timeout: server_selection_timeout(
                    connect_timeout,
                    lookup_timeout,
                ),
            },
            lookup: LookupSettings {
                default_key: get_parsed("LOOKUP_DEFAULT_KEY", "1", is_prod)?,
                timeout: lookup_timeout,
            },
            shutdown_timeout: Duration::from_secs(get_parsed(
                "SHUTDOWN_TIMEOUT_SECS",
                "5",
                is_prod,
            )?),
        })
    }
}

/// Half the lookup deadline, never more than the connect timeout, so a
/// lookup against an unreachable server fails as unavailable rather than
/// running into the deadline.
pub fn server_selection_timeout(connect_timeout: Duration, lookup_timeout: Duration) -> Duration {
    connect_timeout.min(lookup_timeout / 2)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_parsed<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(key, Some(default), is_prod)?;
    raw.parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_uses_default_outside_prod() {
        let value = get_env("LOOKUP_TEST_SURELY_UNSET_VAR", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn unset_variable_is_an_error_in_prod() {
        let result = get_env("LOOKUP_TEST_SURELY_UNSET_VAR", Some("fallback"), true);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn unset_variable_without_default_is_an_error() {
        let result = get_env("LOOKUP_TEST_SURELY_UNSET_VAR", None, false);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn defaults_are_parsed() {
        let secs: u64 = get_parsed("LOOKUP_TEST_SURELY_UNSET_VAR", "2", false).unwrap();
        assert_eq!(secs, 2);

        let key: LookupKey = get_parsed("LOOKUP_TEST_SURELY_UNSET_VAR", "1", false).unwrap();
        assert_eq!(key, LookupKey::Int(1));
    }

    #[test]
    fn unparsable_value_is_a_config_error() {
        let result: Result<u32, _> = get_parsed("LOOKUP_TEST_SURELY_UNSET_VAR", "many", false);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn uri_is_redacted_in_debug_output() {
        let config = MongoConfig {
            uri: Secret::new("mongodb://admin:hunter2@db:27017".to_string()),
            database: "demo".to_string(),
            collection: "test".to_string(),
            max_pool_size: 1,
            connect_timeout: Duration::from_secs(1),
            server_selection_timeout: Duration::from_millis(500),
        };

        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn server_selection_stays_below_lookup_deadline() {
        let lookup = Duration::from_secs(2);

        let selection = server_selection_timeout(Duration::from_secs(10), lookup);
        assert_eq!(selection, Duration::from_secs(1));
        assert!(selection < lookup);

        let selection = server_selection_timeout(Duration::from_millis(300), lookup);
        assert_eq!(selection, Duration::from_millis(300));
    }
}
