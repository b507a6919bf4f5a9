//! Service-to-service routes
//!
//! - `GET /service/ping` - API key guard, rate limited per key

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use tower::ServiceBuilder;

use crate::middleware::{
    rate_limit, require_service_key, RateLimitConfig, RateLimitState, RateLimiter, ServiceCaller,
    ServiceKeys, ServicePrincipal,
};
use crate::routes::DataResponse;

/// Create the `/service` router
pub fn service_router(keys: ServiceKeys, limiter: RateLimiter, limit: RateLimitConfig) -> Router {
    Router::new().route("/service/ping", get(ping)).route_layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(keys, require_service_key))
            .layer(from_fn_with_state(
                RateLimitState::new(limiter, limit),
                rate_limit,
            )),
    )
}

async fn ping(ServiceCaller(principal): ServiceCaller) -> Json<DataResponse<ServicePrincipal>> {
    Json(DataResponse::new(principal))
}
