//! Account session routes
//!
//! - `GET /me` - resolved identity and ecosystem access (rate limited)
//! - `PATCH /me/profile` - profile update, body checked by a field policy
//!   and echoed back once accepted
//!
//! Both routes are also limited per network address ahead of identity
//! resolution, so callers probing unknown account ids are throttled too.

use std::sync::Arc;

use axum::{
    body::Bytes,
    middleware::from_fn_with_state,
    routing::{get, patch},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;

use crate::error::ApiResult;
use crate::middleware::validation::parse_body;
use crate::middleware::{
    authenticate, rate_limit, validate_body, AuthContext, AuthUser, FieldPolicy, IdentityState,
    RateLimitConfig, RateLimitState, RateLimiter,
};
use crate::routes::DataResponse;

/// Fields a profile update may carry
pub const PROFILE_FIELDS: [&str; 2] = ["displayName", "bio"];

/// Longest accepted profile field, in characters
pub const PROFILE_MAX_LENGTH: usize = 280;

/// Create the `/me` router
pub fn session_router(
    identity: IdentityState,
    limiter: RateLimiter,
    network_limit: RateLimitConfig,
    session_limit: RateLimitConfig,
    profile_limit: RateLimitConfig,
) -> Router {
    let policy = Arc::new(FieldPolicy::new(PROFILE_FIELDS).with_max_length(PROFILE_MAX_LENGTH));

    let network = RateLimitState::new(limiter.clone(), network_limit);

    let me = Router::new().route("/me", get(me)).route_layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(network.clone(), rate_limit))
            .layer(from_fn_with_state(identity.clone(), authenticate))
            .layer(from_fn_with_state(
                RateLimitState::new(limiter.clone(), session_limit),
                rate_limit,
            )),
    );

    let profile = Router::new()
        .route("/me/profile", patch(update_profile))
        .route_layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(network, rate_limit))
                .layer(from_fn_with_state(identity, authenticate))
                .layer(from_fn_with_state(
                    RateLimitState::new(limiter, profile_limit),
                    rate_limit,
                ))
                .layer(from_fn_with_state(policy, validate_body)),
        );

    me.merge(profile)
}

async fn me(AuthUser(context): AuthUser) -> Json<DataResponse<AuthContext>> {
    Json(DataResponse::new(context))
}

async fn update_profile(
    AuthUser(context): AuthUser,
    body: Bytes,
) -> ApiResult<Json<DataResponse<Value>>> {
    let profile = parse_body(&body)?;

    tracing::info!(account_id = %context.account.id, "Profile update accepted");

    Ok(Json(DataResponse::new(json!({
        "accountId": context.account.id,
        "profile": profile,
    }))))
}
