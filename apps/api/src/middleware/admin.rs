//! Admin authentication and access-level gate
//!
//! Admins authenticate with the `x-admin-id` header, independently of the
//! account identity. Each gate carries a minimum [`AccessLevel`]; a stored
//! level outside the hierarchy never passes, whatever the gate requires.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, ApiResult};
use crate::models::{AccessLevel, AdminPrincipal};
use crate::repositories::AdminStore;

/// Header carrying the admin principal id
pub const ADMIN_ID_HEADER: &str = "x-admin-id";

/// Admin gate requiring a minimum access level
#[derive(Clone)]
pub struct AdminGate {
    admins: Arc<dyn AdminStore>,
    required: AccessLevel,
}

impl AdminGate {
    /// Gate open to every recognized access level
    pub fn new(admins: Arc<dyn AdminStore>) -> Self {
        Self {
            admins,
            required: AccessLevel::default(),
        }
    }

    /// Same store, different minimum level
    pub fn requiring(&self, required: AccessLevel) -> Self {
        Self {
            admins: Arc::clone(&self.admins),
            required,
        }
    }

    /// Minimum level this gate enforces
    pub fn required(&self) -> AccessLevel {
        self.required
    }

    /// Authenticate the admin behind `headers` and check its level
    pub async fn authorize(&self, headers: &HeaderMap) -> ApiResult<AdminPrincipal> {
        let admin_id = headers
            .get(ADMIN_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthenticated("admin identity required"))?;

        // Unknown ids are reported as forbidden, not not-found
        let record = self
            .admins
            .find_by_id(admin_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(admin_id = %admin_id, "Admin authentication rejected: not found");
                ApiError::forbidden("admin not found")
            })?;

        let principal = AdminPrincipal::try_from(record).map_err(|e| {
            tracing::warn!(admin_id = %admin_id, error = %e, "Admin has unrecognized access level");
            ApiError::forbidden("insufficient access level")
        })?;

        if !principal.access_level.satisfies(self.required) {
            tracing::warn!(
                admin_id = %principal.id,
                level = %principal.access_level,
                required = %self.required,
                "Admin authentication rejected: insufficient access level"
            );
            return Err(ApiError::forbidden("insufficient access level"));
        }

        if let Err(e) = self.admins.touch_last_login(&principal.id).await {
            tracing::warn!(
                error = %e,
                admin_id = %principal.id,
                "Failed to update last_login_at"
            );
        }

        tracing::debug!(
            admin_id = %principal.id,
            level = %principal.access_level,
            "Admin authenticated"
        );

        Ok(principal)
    }
}

/// Axum middleware: authenticate an admin and attach the [`AdminPrincipal`]
pub async fn require_admin(
    State(gate): State<AdminGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = gate.authorize(request.headers()).await?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extractor for handlers behind [`require_admin`]
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminPrincipal);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminPrincipal>()
            .cloned()
            .map(AdminUser)
            .ok_or_else(|| ApiError::unauthenticated("admin identity required"))
    }
}
