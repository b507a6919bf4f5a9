//! Identity resolution middleware
//!
//! Resolves the calling account from either the `x-user-id` header or an
//! `Authorization: Bearer <jwt>` header, loads the account, rejects unknown
//! or inactive accounts, computes the account's ecosystem entitlements and
//! stores an [`AuthContext`] in the request extensions.
//!
//! # Usage
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/me", get(me))
//!     .layer(axum::middleware::from_fn_with_state(identity_state, authenticate));
//!
//! async fn me(auth: AuthUser) -> impl IntoResponse {
//!     Json(auth.0)
//! }
//! ```

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::{Account, EcosystemAccess};
use crate::repositories::AccountStore;
use crate::services::{EcosystemResolver, TokenService};

/// Header carrying the account id directly
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolved caller identity, available to everything downstream of
/// [`authenticate`]
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub account: Account,
    pub ecosystems: EcosystemAccess,
}

/// Shared state for [`authenticate`]
#[derive(Clone)]
pub struct IdentityState {
    accounts: Arc<dyn AccountStore>,
    ecosystems: EcosystemResolver,
    tokens: TokenService,
    trust_identity_header: bool,
}

impl IdentityState {
    /// Create identity state; the `x-user-id` header is trusted by default
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ecosystems: EcosystemResolver,
        tokens: TokenService,
    ) -> Self {
        Self {
            accounts,
            ecosystems,
            tokens,
            trust_identity_header: true,
        }
    }

    /// Whether the `x-user-id` header may identify the caller
    ///
    /// When disabled the header is ignored and only bearer tokens count.
    pub fn trust_identity_header(mut self, trusted: bool) -> Self {
        self.trust_identity_header = trusted;
        self
    }

    /// Resolve the caller behind `headers` into an [`AuthContext`]
    pub async fn resolve(&self, headers: &HeaderMap) -> ApiResult<AuthContext> {
        let account_id = self.candidate_account_id(headers)?;

        let account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or_else(|| ApiError::not_found("account", account_id.clone()))?;

        if !account.is_active {
            tracing::warn!(account_id = %account.id, "Authentication rejected: account inactive");
            return Err(ApiError::forbidden("account is inactive"));
        }

        let ecosystems = self.ecosystems.resolve(&account.id).await;

        if let Err(e) = self.accounts.touch_last_active(&account.id).await {
            tracing::warn!(
                error = %e,
                account_id = %account.id,
                "Failed to update last_active_at"
            );
        }

        tracing::debug!(account_id = %account.id, "Request authenticated");

        Ok(AuthContext {
            account,
            ecosystems,
        })
    }

    /// Extract the claimed account id without trusting it yet
    fn candidate_account_id(&self, headers: &HeaderMap) -> ApiResult<String> {
        if self.trust_identity_header {
            if let Some(id) = extract_direct_identity(headers) {
                return Ok(id.to_string());
            }
        }

        match headers.get(AUTHORIZATION) {
            None => Err(ApiError::unauthenticated("no identity supplied")),
            Some(_) => {
                let token = extract_bearer_token(headers)
                    .ok_or_else(|| ApiError::unauthenticated("invalid credentials"))?;
                Ok(self.tokens.verify(token)?.sub)
            }
        }
    }
}

/// Axum middleware: resolve the caller and attach an [`AuthContext`]
pub async fn authenticate(
    State(state): State<IdentityState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = state.resolve(request.headers()).await?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Extract the `x-user-id` header value, ignoring blanks
fn extract_direct_identity(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Extract bearer token from Authorization header (case-insensitive scheme)
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;

    // Reject malformed values like "Bearer <token> <extra>"
    if parts.next().is_some() {
        return None;
    }

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Extractor for handlers behind [`authenticate`]
///
/// Returns 401 if the middleware did not run for this route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthenticated("authentication required"))
    }
}
