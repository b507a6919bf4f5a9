//! Request body field policy
//!
//! A [`FieldPolicy`] names the fields a route accepts and an optional
//! maximum length. Unexpected fields are all reported together; length and
//! injection checks stop at the first offending field, in allow-list order.
//! Suspect input is rejected, never rewritten.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Largest body the validator will buffer
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Markup and script patterns rejected in any allow-listed string field
static INJECTION_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("script tag", r"(?i)<\s*script\b"),
        ("iframe tag", r"(?i)<\s*iframe\b"),
        ("javascript uri", r"(?i)javascript\s*:"),
        ("inline event handler", r"(?i)\bon\w+\s*="),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| match Regex::new(pattern) {
        Ok(regex) => Some((name, regex)),
        Err(e) => {
            tracing::error!(pattern = name, error = %e, "Invalid injection pattern");
            None
        }
    })
    .collect()
});

/// Name of the first injection pattern `value` matches
fn injection_match(value: &str) -> Option<&'static str> {
    INJECTION_PATTERNS
        .iter()
        .find(|(_, regex)| regex.is_match(value))
        .map(|(name, _)| *name)
}

/// Allow-list of body fields with an optional length limit
#[derive(Debug, Clone)]
pub struct FieldPolicy {
    allowed: Vec<String>,
    max_length: Option<usize>,
}

impl FieldPolicy {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            max_length: None,
        }
    }

    /// Limit string fields to `max_length` characters
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Validate a parsed body
    pub fn validate(&self, body: &Value) -> ApiResult<()> {
        let fields = body
            .as_object()
            .ok_or_else(|| ApiError::validation("request body must be a JSON object", vec![]))?;

        self.check_unexpected(fields)?;

        for name in &self.allowed {
            let Some(Value::String(value)) = fields.get(name) else {
                continue;
            };

            if let Some(max_length) = self.max_length {
                if value.chars().count() > max_length {
                    return Err(ApiError::validation(
                        format!("field {} exceeds maximum length of {}", name, max_length),
                        vec![name.clone()],
                    ));
                }
            }

            if let Some(pattern) = injection_match(value) {
                tracing::debug!(field = %name, pattern = pattern, "Rejected suspect field content");
                return Err(ApiError::validation(
                    format!("field {} contains disallowed content", name),
                    vec![name.clone()],
                ));
            }
        }

        Ok(())
    }

    fn check_unexpected(&self, fields: &Map<String, Value>) -> ApiResult<()> {
        let unexpected: Vec<String> = fields
            .keys()
            .filter(|key| !self.allowed.iter().any(|allowed| allowed == *key))
            .cloned()
            .collect();

        if unexpected.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(
                format!("unexpected fields: {}", unexpected.join(", ")),
                unexpected,
            ))
        }
    }
}

/// Parse raw body bytes; an empty body is an empty object
pub fn parse_body(bytes: &[u8]) -> ApiResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
        .map_err(|_| ApiError::validation("request body must be valid JSON", vec![]))
}

/// Axum middleware: buffer the body, validate it, and pass it on unchanged
pub async fn validate_body(
    State(policy): State<Arc<FieldPolicy>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::validation("request body too large or unreadable", vec![]))?;

    policy.validate(&parse_body(&bytes)?)?;

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
