//! Journey API library
//!
//! Access-control core for the People Power Journey mini-app backend:
//! identity resolution, ecosystem entitlements, admin access levels, rate
//! limiting, request body validation and service key checks, exposed as
//! axum middleware. This module also assembles the API router so the
//! binary and the integration tests share one wiring.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use services::{TokenConfig, TokenService};

use middleware::{AdminGate, IdentityState, RateLimitConfig, RateLimiter, ServiceKeys};
use repositories::{AccountStore, AdminStore, MembershipStore};
use services::EcosystemResolver;

/// Per-route rate limits
#[derive(Debug, Clone)]
pub struct RouteLimits {
    /// Per network address on `/me` routes, checked before identity
    pub network: RateLimitConfig,
    /// `GET /me`
    pub session: RateLimitConfig,
    /// `PATCH /me/profile`
    pub profile: RateLimitConfig,
    /// `/service/*`
    pub service: RateLimitConfig,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            network: RateLimitConfig::per_minute("network", 120),
            session: RateLimitConfig::per_minute("session", 60),
            profile: RateLimitConfig::per_minute("profile", 10),
            service: RateLimitConfig::per_minute("service", 600),
        }
    }
}

/// Everything the API router needs
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityState,
    pub admin: AdminGate,
    pub service_keys: ServiceKeys,
    pub limiter: RateLimiter,
    pub limits: RouteLimits,
}

impl AppState {
    /// Assemble state from the datastore seams and token service
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        memberships: Arc<dyn MembershipStore>,
        admins: Arc<dyn AdminStore>,
        tokens: TokenService,
    ) -> Self {
        Self {
            identity: IdentityState::new(accounts, EcosystemResolver::new(memberships), tokens),
            admin: AdminGate::new(admins),
            service_keys: ServiceKeys::default(),
            limiter: RateLimiter::new(),
            limits: RouteLimits::default(),
        }
    }

    /// Whether `x-user-id` may identify a caller without a token
    pub fn with_identity_header_trusted(mut self, trusted: bool) -> Self {
        self.identity = self.identity.trust_identity_header(trusted);
        self
    }

    pub fn with_service_keys(mut self, keys: ServiceKeys) -> Self {
        self.service_keys = keys;
        self
    }

    /// Key network callers by `X-Forwarded-For`/`X-Real-IP` (behind a trusted proxy)
    pub fn with_proxy_headers_trusted(mut self, trusted: bool) -> Self {
        self.limiter = self.limiter.trust_proxy_headers(trusted);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_limits(mut self, limits: RouteLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Build the access-controlled API router (health routes are mounted separately)
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::session_router(
            state.identity.clone(),
            state.limiter.clone(),
            state.limits.network.clone(),
            state.limits.session.clone(),
            state.limits.profile.clone(),
        ))
        .merge(routes::ecosystem_router(state.identity))
        .merge(routes::admin_router(state.admin))
        .merge(routes::service_router(
            state.service_keys,
            state.limiter,
            state.limits.service,
        ))
}
