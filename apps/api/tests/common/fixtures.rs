//! Test fixtures for API integration tests
//!
//! [`TestApp`] wires the real router over in-memory stores and offers
//! request helpers that drive it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use journey_api::middleware::{RateLimiter, ServiceKeys};
use journey_api::models::{Account, Ecosystem};
use journey_api::{api_router, AppState, RouteLimits, TokenConfig, TokenService};

use super::mocks::{InMemoryAccounts, InMemoryAdmins, InMemoryMemberships};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-characters";
pub const TEST_SERVICE_KEY: &str = "bot-service-key";

/// Build an active account
pub fn active_account(id: &str) -> Account {
    Account {
        id: id.to_string(),
        username: Some(format!("{}_name", id)),
        email: Some(format!("{}@journey.test", id)),
        is_active: true,
        last_active_at: None,
    }
}

/// Build an inactive account
pub fn inactive_account(id: &str) -> Account {
    Account {
        is_active: false,
        ..active_account(id)
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(TokenConfig::new(TEST_JWT_SECRET))
}

/// Router plus handles on the stores behind it
pub struct TestApp {
    pub accounts: Arc<InMemoryAccounts>,
    pub memberships: Arc<InMemoryMemberships>,
    pub admins: Arc<InMemoryAdmins>,
    pub tokens: TokenService,
    state: AppState,
}

impl TestApp {
    /// App trusting `x-user-id`, with one service key and default limits
    pub fn new() -> Self {
        let accounts = Arc::new(InMemoryAccounts::default());
        let memberships = Arc::new(InMemoryMemberships::default());
        let admins = Arc::new(InMemoryAdmins::default());
        let tokens = token_service();

        let state = AppState::new(
            accounts.clone(),
            memberships.clone(),
            admins.clone(),
            tokens.clone(),
        )
        .with_service_keys(ServiceKeys::new([TEST_SERVICE_KEY]));

        Self {
            accounts,
            memberships,
            admins,
            tokens,
            state,
        }
    }

    pub fn trust_identity_header(mut self, trusted: bool) -> Self {
        self.state = self.state.with_identity_header_trusted(trusted);
        self
    }

    /// Replace route limits, starting from a fresh limiter
    pub fn with_limits(mut self, limits: RouteLimits) -> Self {
        let limiter =
            RateLimiter::new().trust_proxy_headers(self.state.limiter.trusts_proxy_headers());
        self.state = self.state.with_limits(limits).with_rate_limiter(limiter);
        self
    }

    pub fn trust_proxy_headers(mut self) -> Self {
        self.state = self.state.with_proxy_headers_trusted(true);
        self
    }

    /// Seed an active account enrolled in the given ecosystems
    pub fn with_account(self, id: &str, ecosystems: &[Ecosystem]) -> Self {
        self.accounts.insert(active_account(id));
        for ecosystem in ecosystems {
            self.memberships.enroll(id, *ecosystem);
        }
        self
    }

    pub fn router(&self) -> Router {
        api_router(self.state.clone())
    }

    /// Send a request through a router built from the current state
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub fn bearer(&self, account_id: &str) -> String {
        format!("Bearer {}", self.tokens.issue(account_id).unwrap())
    }
}

/// GET request with headers
pub fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    request(Method::GET, uri, headers, Body::empty())
}

/// GET request arriving from the given socket peer
pub fn get_from(uri: &str, peer: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut request = get(uri, headers);
    let peer: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

/// Request with a raw JSON body
pub fn json_request(
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> Request<Body> {
    let mut with_type: Vec<(&str, &str)> = headers.to_vec();
    with_type.push(("content-type", "application/json"));
    request(method, uri, &with_type, Body::from(body.to_string()))
}

fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(body).unwrap()
}

/// Read a response body as JSON
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert status and error code of a failure response, returning the body
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) -> Value {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], code);
    body
}
