//! API server configuration

use std::env;

use anyhow::{bail, Context, Result};
use journey_shared_config::{
    parse_bool_env, parse_list_env, CommonConfig, DatabaseConfig, Environment, RedisConfig,
};

/// Minimum required length for JWT_SECRET to be considered secure
const MIN_JWT_SECRET_LENGTH: usize = 32;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 8080)
    pub port: u16,

    /// JWT secret for bearer token verification
    pub jwt_secret: String,

    /// Expected `iss` claim (default: journey)
    pub jwt_issuer: String,

    /// Token lifetime for issued tokens (default: 1h)
    pub jwt_expiry: String,

    /// Keys accepted by the service key guard
    pub service_api_keys: Vec<String>,

    /// Whether `x-user-id` may identify a caller without a token
    ///
    /// Defaults to on outside production, off in production.
    pub identity_header_trusted: bool,

    /// Whether rate limits may key callers by `X-Forwarded-For`/`X-Real-IP`
    ///
    /// Only enable behind a proxy that overwrites these headers (default: off).
    pub trust_proxy_headers: bool,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode, this function requires:
    /// - `JWT_SECRET`: Must be set and at least 32 characters long
    /// - `DATABASE_URL`: Must be explicitly set (no insecure defaults)
    ///
    /// In development/staging mode, sensible defaults are used for convenience.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_env();
        let is_production = environment.is_production();

        let jwt_secret = Self::load_jwt_secret(is_production)?;

        if is_production {
            Self::validate_database_url()?;
        }

        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let identity_header_trusted = parse_bool_env("IDENTITY_HEADER_TRUSTED", !is_production)
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        let trust_proxy_headers = parse_bool_env("TRUST_PROXY_HEADERS", false)
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        let cors_allowed_origins = Some(parse_list_env("CORS_ORIGINS")).filter(|o| !o.is_empty());

        Ok(Self {
            common,

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT value")?,

            jwt_secret,

            jwt_issuer: env::var("JWT_ISSUER")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "journey".to_string()),

            jwt_expiry: env::var("JWT_EXPIRY").unwrap_or_else(|_| "1h".to_string()),

            service_api_keys: parse_list_env("SERVICE_API_KEYS"),

            identity_header_trusted,

            trust_proxy_headers,

            cors_allowed_origins,
        })
    }

    /// Load and validate JWT_SECRET
    ///
    /// In production:
    /// - JWT_SECRET must be explicitly set
    /// - Must be at least MIN_JWT_SECRET_LENGTH characters
    ///
    /// In development: uses a default value with a warning
    fn load_jwt_secret(is_production: bool) -> Result<String> {
        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => {
                if is_production && secret.len() < MIN_JWT_SECRET_LENGTH {
                    bail!(
                        "JWT_SECRET must be at least {} characters in production (got {})",
                        MIN_JWT_SECRET_LENGTH,
                        secret.len()
                    );
                }
                Ok(secret)
            }
            _ if is_production => {
                bail!(
                    "JWT_SECRET environment variable is required in production. \
                     Please set a secure secret of at least {} characters.",
                    MIN_JWT_SECRET_LENGTH
                );
            }
            _ => {
                tracing::warn!(
                    "JWT_SECRET not set, using insecure default. \
                     This is only acceptable in development mode."
                );
                Ok("development-secret-change-in-production".to_string())
            }
        }
    }

    /// Validate that DATABASE_URL is explicitly set in production
    fn validate_database_url() -> Result<()> {
        match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Ok(()),
            _ => {
                bail!(
                    "DATABASE_URL environment variable is required in production. \
                     Please set your PostgreSQL connection string."
                );
            }
        }
    }

    /// Get database configuration
    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    /// Get Redis configuration (if configured)
    pub fn redis(&self) -> Option<&RedisConfig> {
        self.common.redis.as_ref()
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}
