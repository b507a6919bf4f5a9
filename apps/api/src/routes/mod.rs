//! HTTP routes for the Journey API
//!
//! These routes wire the access-control middleware into a running server:
//! - Health check endpoints
//! - Account session and profile endpoints
//! - Ecosystem-gated endpoints
//! - Admin endpoints
//! - Service-to-service endpoints

pub mod admin;
pub mod ecosystems;
pub mod health;
pub mod service;
pub mod session;

pub use admin::admin_router;
pub use ecosystems::ecosystem_router;
pub use health::{health_router, HealthState};
pub use service::service_router;
pub use session::session_router;

use serde::Serialize;

/// Success envelope: `{"success": true, "data": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
