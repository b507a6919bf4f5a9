//! Middleware components for the Journey API
//!
//! Request guards, each an `axum::middleware::from_fn_with_state` function:
//! - `authenticate`: resolves the calling account and its ecosystem access
//! - `require_ecosystem`: rejects callers not enrolled in an ecosystem
//! - `require_admin`: authenticates an admin and checks its access level
//! - `rate_limit`: fixed-window request limiting per caller
//! - `validate_body`: field allow-list and injection checks for JSON bodies
//! - `require_service_key`: service-to-service API key check
//!
//! And extractors for handlers behind them: `AuthUser`, `AdminUser`,
//! `ServiceCaller`.

pub mod admin;
pub mod ecosystem;
pub mod identity;
pub mod rate_limit;
pub mod service_key;
pub mod validation;

pub use admin::{require_admin, AdminGate, AdminUser, ADMIN_ID_HEADER};
pub use ecosystem::{check_ecosystem_access, require_ecosystem};
pub use identity::{authenticate, AuthContext, AuthUser, IdentityState, USER_ID_HEADER};
pub use rate_limit::{
    extract_client_ip, rate_limit, InMemoryRateLimiter, RateLimitConfig, RateLimitState,
    RateLimiter,
};
pub use service_key::{
    require_service_key, ServiceCaller, ServiceKeys, ServicePrincipal, API_KEY_HEADER,
};
pub use validation::{validate_body, FieldPolicy};
