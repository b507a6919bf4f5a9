//! Bearer token issuing and verification
//!
//! Account bearer tokens are HS256 JWTs. Verification checks the signature,
//! expiry, issuer and audience before the `sub` claim is handed to the
//! identity resolver, which still has to find an active account for it.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::error::{ApiError, ApiResult};
use crate::models::Claims;

/// Token service configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Token TTL in seconds (default: 1 hour)
    pub ttl_secs: i64,
    /// JWT issuer
    pub issuer: String,
    /// JWT audience
    pub audience: String,
}

impl TokenConfig {
    /// Create a new TokenConfig with the default TTL
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            ttl_secs: 3600,
            issuer: "journey".to_string(),
            audience: "journey-miniapp".to_string(),
        }
    }

    /// Override the issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Create a config whose TTL comes from a string like "15m" or "7d"
    pub fn with_expiry_string(self, expiry: &str) -> Self {
        let ttl_secs = parse_duration_string(expiry).unwrap_or(self.ttl_secs);
        Self { ttl_secs, ..self }
    }
}

/// Parse duration strings like "15m", "7d", "24h" to seconds
fn parse_duration_string(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (unit_start, unit) = s.char_indices().last()?;
    let num: i64 = s[..unit_start].parse().ok()?;

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 24 * 3600,
        _ => return None,
    };
    num.checked_mul(multiplier)
}

/// Issues and verifies account bearer tokens
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("ttl_secs", &self.config.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a new TokenService instance
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a bearer token for `account_id`
    pub fn issue(&self, account_id: &str) -> ApiResult<String> {
        let claims = Claims::new(
            account_id,
            self.config.ttl_secs,
            &self.config.issuer,
            &self.config.audience,
        );
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {}", e)))
    }

    /// Verify a bearer token and return its claims
    ///
    /// Any decoding failure (bad signature, expired, wrong audience, not a
    /// JWT at all) is reported as `Unauthenticated`.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token verification failed");
            ApiError::unauthenticated("invalid credentials")
        })?;

        if token_data.claims.sub.is_empty() {
            return Err(ApiError::unauthenticated("invalid credentials"));
        }

        Ok(token_data.claims)
    }
}
