//! Service-to-service API key guard
//!
//! Internal services authenticate with the `x-api-key` header. Configured
//! keys are held only as SHA-256 digests and every presented key is
//! compared against all of them.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::{Choice, ConstantTimeEq};

use crate::error::{ApiError, ApiResult};

/// Header carrying the service API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Length of the hex fingerprint exposed for logging and rate limiting
const FINGERPRINT_LEN: usize = 16;

/// Authenticated calling service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipal {
    /// Truncated digest of the presented key
    pub key_fingerprint: String,
}

/// Configured service keys, stored as digests
#[derive(Clone, Default)]
pub struct ServiceKeys {
    digests: Arc<Vec<[u8; 32]>>,
}

impl std::fmt::Debug for ServiceKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceKeys")
            .field("count", &self.digests.len())
            .finish()
    }
}

impl ServiceKeys {
    /// Build from plaintext keys; blank entries are ignored
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let digests = keys
            .into_iter()
            .filter(|key| !key.as_ref().trim().is_empty())
            .map(|key| digest(key.as_ref().trim()))
            .collect();
        Self {
            digests: Arc::new(digests),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Check a presented key against every configured key
    pub fn verify(&self, presented: &str) -> Option<ServicePrincipal> {
        let candidate = Sha256::digest(presented.as_bytes());

        // Visit every key so timing does not reveal which one matched
        let matched = self
            .digests
            .iter()
            .fold(Choice::from(0), |found, known| {
                found | known[..].ct_eq(&candidate[..])
            });

        bool::from(matched).then(|| ServicePrincipal {
            key_fingerprint: format!("{:x}", candidate)[..FINGERPRINT_LEN].to_string(),
        })
    }

    /// Authenticate the service behind `headers`
    pub fn authorize(&self, headers: &HeaderMap) -> ApiResult<ServicePrincipal> {
        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthenticated("API key required"))?;

        self.verify(presented).ok_or_else(|| {
            tracing::warn!("Service authentication rejected: unknown API key");
            ApiError::unauthenticated("invalid API key")
        })
    }
}

fn digest(key: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.finalize().into()
}

/// Axum middleware: require a configured API key
pub async fn require_service_key(
    State(keys): State<ServiceKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = keys.authorize(request.headers())?;
    tracing::debug!(key = %principal.key_fingerprint, "Service authenticated");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extractor for handlers behind [`require_service_key`]
#[derive(Debug, Clone)]
pub struct ServiceCaller(pub ServicePrincipal);

#[async_trait]
impl<S> FromRequestParts<S> for ServiceCaller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ServicePrincipal>()
            .cloned()
            .map(ServiceCaller)
            .ok_or_else(|| ApiError::unauthenticated("API key required"))
    }
}
