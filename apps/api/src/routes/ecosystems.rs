//! Ecosystem-gated routes
//!
//! One `GET /ecosystems/<name>` route per ecosystem. Each runs identity
//! resolution and then the entitlement guard for its ecosystem.

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;

use crate::middleware::{authenticate, require_ecosystem, AuthUser, IdentityState};
use crate::models::Ecosystem;
use crate::routes::DataResponse;

/// Create the `/ecosystems` router
pub fn ecosystem_router(identity: IdentityState) -> Router {
    Ecosystem::ALL
        .into_iter()
        .fold(Router::new(), |router, ecosystem| {
            let route = Router::new()
                .route(
                    &format!("/ecosystems/{}", ecosystem),
                    get(move |AuthUser(context): AuthUser| async move {
                        Json(DataResponse::new(entry(ecosystem, &context.account.id)))
                    }),
                )
                .route_layer(
                    ServiceBuilder::new()
                        .layer(from_fn_with_state(identity.clone(), authenticate))
                        .layer(from_fn_with_state(ecosystem, require_ecosystem)),
                );
            router.merge(route)
        })
}

fn entry(ecosystem: Ecosystem, account_id: &str) -> Value {
    json!({
        "ecosystem": ecosystem,
        "accountId": account_id,
        "granted": true,
    })
}
