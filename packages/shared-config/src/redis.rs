//! Redis configuration types
//!
//! Redis is optional. Without it, rate limits are counted per process.

use crate::{parse_env, ConfigResult};

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Optional password for Redis authentication
    pub password: Option<String>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl RedisConfig {
    /// Load Redis configuration from environment variables
    ///
    /// Returns `Ok(None)` when `REDIS_URL` is unset or empty.
    pub fn from_env() -> ConfigResult<Option<Self>> {
        let url = match std::env::var("REDIS_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };

        Ok(Some(Self {
            url,
            password: std::env::var("REDIS_PASSWORD").ok().filter(|s| !s.is_empty()),
            connect_timeout_secs: parse_env("REDIS_CONNECT_TIMEOUT", 5)?,
        }))
    }

    /// Create a configuration with a custom URL (useful for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            password: None,
            connect_timeout_secs: 5,
        }
    }

    /// Build the full connection URL including password if set
    pub fn connection_url(&self) -> String {
        if let Some(ref password) = self.password {
            if let Some(at_pos) = self.url.find("://") {
                let (scheme, rest) = self.url.split_at(at_pos + 3);
                return format!("{}:{}@{}", scheme, password, rest);
            }
        }
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_url() {
        let config = RedisConfig::with_url("redis://custom:6380");
        assert_eq!(config.url, "redis://custom:6380");
        assert!(config.password.is_none());
    }

    #[test]
    fn test_connection_url_no_password() {
        let config = RedisConfig::with_url("redis://localhost:6379");
        assert_eq!(config.connection_url(), "redis://localhost:6379");
    }

    #[test]
    fn test_connection_url_with_password() {
        let mut config = RedisConfig::with_url("redis://localhost:6379");
        config.password = Some("hunter2".to_string());
        assert_eq!(config.connection_url(), "redis://:hunter2@localhost:6379");
    }

    #[test]
    fn test_from_env_unset_is_none() {
        temp_env::with_var_unset("REDIS_URL", || {
            assert!(RedisConfig::from_env().unwrap().is_none());
        });
    }

    #[test]
    fn test_from_env_set() {
        temp_env::with_vars(
            [
                ("REDIS_URL", Some("redis://cache:6379")),
                ("REDIS_PASSWORD", None),
            ],
            || {
                let config = RedisConfig::from_env().unwrap().unwrap();
                assert_eq!(config.url, "redis://cache:6379");
                assert_eq!(config.connect_timeout_secs, 5);
            },
        );
    }
}
