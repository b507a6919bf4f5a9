//! Ecosystem entitlement guard
//!
//! Runs after [`authenticate`](super::identity::authenticate) and rejects
//! callers that are not enrolled in the route's ecosystem.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, ApiResult};
use crate::middleware::identity::AuthContext;
use crate::models::Ecosystem;

/// Check a resolved context against a required ecosystem
pub fn check_ecosystem_access(context: Option<&AuthContext>, required: Ecosystem) -> ApiResult<()> {
    let context = context.ok_or_else(|| ApiError::unauthenticated("authentication required"))?;

    if context.ecosystems.has(required) {
        Ok(())
    } else {
        tracing::debug!(
            account_id = %context.account.id,
            ecosystem = %required,
            "Ecosystem access denied"
        );
        Err(ApiError::forbidden(format!(
            "access denied to ecosystem {}",
            required
        )))
    }
}

/// Axum middleware: require membership in the ecosystem held as state
pub async fn require_ecosystem(
    State(required): State<Ecosystem>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_ecosystem_access(request.extensions().get::<AuthContext>(), required)?;
    Ok(next.run(request).await)
}
