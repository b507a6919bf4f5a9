//! Admin routes
//!
//! - `GET /admin/session` - any recognized admin level
//! - `GET /admin/audit` - ADMINISTRATOR and above

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};

use crate::middleware::{require_admin, AdminGate, AdminUser};
use crate::models::{AccessLevel, AdminPrincipal};
use crate::routes::DataResponse;

/// Create the `/admin` router
pub fn admin_router(gate: AdminGate) -> Router {
    let session = Router::new()
        .route("/admin/session", get(admin_session))
        .route_layer(from_fn_with_state(
            gate.requiring(AccessLevel::ReadOnly),
            require_admin,
        ));

    let audit = Router::new()
        .route("/admin/audit", get(admin_session))
        .route_layer(from_fn_with_state(
            gate.requiring(AccessLevel::Administrator),
            require_admin,
        ));

    session.merge(audit)
}

async fn admin_session(AdminUser(principal): AdminUser) -> Json<DataResponse<AdminPrincipal>> {
    Json(DataResponse::new(principal))
}
