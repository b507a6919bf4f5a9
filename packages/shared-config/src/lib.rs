//! Shared configuration types for People Power Journey services
//!
//! This crate holds the configuration pieces every service needs (database,
//! optional Redis, environment mode) so the API server and any future bot or
//! admin processes agree on variable names and defaults.

mod database;
mod error;
mod redis;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ConfigResult};
pub use redis::RedisConfig;

use std::env;

use serde::Serialize;

/// Common configuration shared between all services
#[derive(Debug, Clone)]
pub struct CommonConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration, present only when `REDIS_URL` is set
    pub redis: Option<RedisConfig>,

    /// Environment mode (development, staging, production)
    pub environment: Environment,

    /// Log level (from RUST_LOG or LOG_LEVEL)
    pub log_level: String,
}

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        })
    }
}

impl Environment {
    /// Read the mode from `ENVIRONMENT`, defaulting to development
    pub fn from_env() -> Self {
        env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .parse()
            .unwrap_or_default()
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl CommonConfig {
    /// Load common configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            environment: Environment::from_env(),
            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Check if a shared Redis instance is configured
    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }
}

/// Helper function to get a required environment variable
pub fn get_required_env(name: &str) -> ConfigResult<String> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Helper function to get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

/// Read a comma-separated list, dropping blank entries
///
/// Returns an empty list when the variable is unset.
pub fn parse_list_env(name: &str) -> Vec<String> {
    env::var(name)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a boolean flag such as `true`, `1`, `yes` or `off`
pub fn parse_bool_env(name: &str, default: bool) -> ConfigResult<bool> {
    match env::var(name) {
        Ok(val) => match val.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue(
                name.to_string(),
                format!("expected a boolean, got '{}'", other),
            )),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "prod".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "stage".parse::<Environment>().unwrap(),
            Environment::Staging
        );
        assert_eq!(
            "anything".parse::<Environment>().unwrap(),
            Environment::Development
        );
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(format!("{}", Environment::Production), "production");
        assert_eq!(format!("{}", Environment::Staging), "staging");
        assert_eq!(format!("{}", Environment::Development), "development");
    }

    #[test]
    fn test_parse_list_env() {
        temp_env::with_var("TEST_JOURNEY_LIST", Some(" a, b ,,c "), || {
            assert_eq!(parse_list_env("TEST_JOURNEY_LIST"), vec!["a", "b", "c"]);
        });
        temp_env::with_var_unset("TEST_JOURNEY_LIST", || {
            assert!(parse_list_env("TEST_JOURNEY_LIST").is_empty());
        });
    }

    #[test]
    fn test_parse_bool_env() {
        temp_env::with_var("TEST_JOURNEY_FLAG", Some("off"), || {
            assert!(!parse_bool_env("TEST_JOURNEY_FLAG", true).unwrap());
        });
        temp_env::with_var("TEST_JOURNEY_FLAG", Some("YES"), || {
            assert!(parse_bool_env("TEST_JOURNEY_FLAG", false).unwrap());
        });
        temp_env::with_var("TEST_JOURNEY_FLAG", Some("maybe"), || {
            assert!(parse_bool_env("TEST_JOURNEY_FLAG", false).is_err());
        });
        temp_env::with_var_unset("TEST_JOURNEY_FLAG", || {
            assert!(parse_bool_env("TEST_JOURNEY_FLAG", true).unwrap());
        });
    }

    #[test]
    fn test_parse_env_invalid_value() {
        temp_env::with_var("TEST_JOURNEY_NUM", Some("abc"), || {
            let result: ConfigResult<u32> = parse_env("TEST_JOURNEY_NUM", 5);
            assert!(matches!(result, Err(ConfigError::InvalidValue(..))));
        });
    }
}
