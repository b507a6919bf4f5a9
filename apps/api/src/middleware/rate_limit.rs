//! Fixed-window rate limiting middleware
//!
//! Each caller gets a counter per route prefix that resets when its window
//! elapses. Callers are keyed by account (`user:<id>`), then by service key
//! fingerprint (`service:<fp>`), then by network address (`ip:<addr>`).
//!
//! The network address is the socket peer. `X-Forwarded-For` and
//! `X-Real-IP` are only consulted when the limiter is told it sits behind
//! a trusted proxy; otherwise a client could pick its own key.
//!
//! The limiter keeps windows in process memory. When a Redis client is
//! attached the same algorithm runs in a Lua script so the limit is shared
//! across instances; if Redis is unavailable the in-memory windows take
//! over, so limiting stays active during an outage (per instance only).

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::middleware::identity::AuthContext;
use crate::middleware::service_key::ServicePrincipal;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Rate limit configuration for one route or route group
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Key prefix separating limits of different routes (e.g. "profile")
    pub key_prefix: String,
    /// Maximum number of requests allowed per window (at least 1)
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitConfig {
    /// Create a new rate limit configuration
    pub fn new(key_prefix: impl Into<String>, max_requests: u32, window: Duration) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            max_requests: max_requests.max(1),
            window,
        }
    }

    /// Per-minute limit
    pub fn per_minute(key_prefix: impl Into<String>, max_requests: u32) -> Self {
        Self::new(key_prefix, max_requests, Duration::from_secs(60))
    }
}

/// Outcome of an allowed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    /// Requests left in the current window
    pub remaining: u32,
    /// Seconds until the window resets
    pub reset_secs: u64,
}

/// Result of a limiter check: allowance, or seconds to wait
pub type RateLimitResult = Result<Allowance, u64>;

/// One caller's counter for the current window
#[derive(Debug, Clone)]
struct RateLimitWindow {
    count: u32,
    reset_at: Instant,
}

impl RateLimitWindow {
    fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + window,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.reset_at
    }

    /// Count the request if the window has room
    fn check_and_record(&mut self, max_requests: u32, now: Instant) -> RateLimitResult {
        let until_reset = self.reset_at.saturating_duration_since(now);

        if self.count >= max_requests {
            return Err(ceil_secs(until_reset));
        }

        self.count += 1;
        Ok(Allowance {
            remaining: max_requests - self.count,
            reset_secs: ceil_secs(until_reset),
        })
    }
}

/// Whole seconds, rounded up, never below 1
fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.max(1)
}

/// In-process fixed-window limiter
///
/// Check and increment happen under one write lock, so two concurrent
/// requests cannot both take the last slot.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    entries: RwLock<HashMap<String, RateLimitWindow>>,
    last_cleanup: RwLock<Instant>,
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRateLimiter {
    /// Create an empty limiter
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            last_cleanup: RwLock::new(Instant::now()),
        }
    }

    /// Check and record a request for `key` now
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        self.check_at(key, config, Instant::now()).await
    }

    /// Check and record a request for `key` at the given instant
    pub async fn check_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> RateLimitResult {
        let full_key = format!("{}:{}", config.key_prefix, key);

        self.maybe_cleanup(now).await;

        let mut entries = self.entries.write().await;
        let window = entries
            .entry(full_key.clone())
            .and_modify(|window| {
                if window.is_expired(now) {
                    *window = RateLimitWindow::new(now, config.window);
                }
            })
            .or_insert_with(|| RateLimitWindow::new(now, config.window));

        let result = window.check_and_record(config.max_requests, now);

        match &result {
            Ok(allowance) => {
                debug!(key = %full_key, remaining = allowance.remaining, "Rate limit check passed");
            }
            Err(retry_after) => {
                debug!(key = %full_key, retry_after = retry_after, "Rate limit exceeded");
            }
        }

        result
    }

    /// Drop expired windows, at most once per cleanup interval
    async fn maybe_cleanup(&self, now: Instant) {
        {
            let last_cleanup = self.last_cleanup.read().await;
            if now.saturating_duration_since(*last_cleanup) < CLEANUP_INTERVAL {
                return;
            }
        }

        let mut last_cleanup = self.last_cleanup.write().await;

        // Another request may have cleaned up while we waited for the lock
        if now.saturating_duration_since(*last_cleanup) < CLEANUP_INTERVAL {
            return;
        }

        *last_cleanup = now;
        drop(last_cleanup);

        let mut entries = self.entries.write().await;
        let initial_count = entries.len();
        entries.retain(|_, window| !window.is_expired(now));

        let removed = initial_count - entries.len();
        if removed > 0 {
            debug!(
                removed = removed,
                remaining = entries.len(),
                "Cleaned up expired rate limit windows"
            );
        }
    }

    /// Number of tracked windows
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Atomic fixed window: returns {allowed, count, ttl_ms}
const FIXED_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local max_requests = tonumber(ARGV[1])
local window_ms = tonumber(ARGV[2])

local current = tonumber(redis.call('GET', key) or '0')
if current >= max_requests then
    local ttl = redis.call('PTTL', key)
    if ttl < 0 then
        redis.call('PEXPIRE', key, window_ms)
        ttl = window_ms
    end
    return {0, current, ttl}
end

current = redis.call('INCR', key)
if current == 1 then
    redis.call('PEXPIRE', key, window_ms)
end
local ttl = redis.call('PTTL', key)
if ttl < 0 then
    redis.call('PEXPIRE', key, window_ms)
    ttl = window_ms
end
return {1, current, ttl}
"#;

/// Shared limiter handle, cloned into route state
#[derive(Clone, Default)]
pub struct RateLimiter {
    redis: Option<Arc<redis::Client>>,
    fallback: Arc<InMemoryRateLimiter>,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    /// In-memory limiter (per instance)
    pub fn new() -> Self {
        Self::default()
    }

    /// Limiter backed by Redis, falling back to memory on Redis errors
    pub fn with_redis(client: redis::Client) -> Self {
        Self {
            redis: Some(Arc::new(client)),
            fallback: Arc::new(InMemoryRateLimiter::new()),
            trust_proxy_headers: false,
        }
    }

    /// Key network callers by proxy headers instead of the socket peer
    pub fn trust_proxy_headers(mut self, trusted: bool) -> Self {
        self.trust_proxy_headers = trusted;
        self
    }

    pub fn trusts_proxy_headers(&self) -> bool {
        self.trust_proxy_headers
    }

    /// Whether a Redis backend is attached
    pub fn is_distributed(&self) -> bool {
        self.redis.is_some()
    }

    /// Check and record a request for `key`
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let Some(client) = &self.redis else {
            return self.fallback.check(key, config).await;
        };

        let full_key = format!("ratelimit:{}:{}", config.key_prefix, key);

        let mut conn = match client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(
                    error = %e,
                    "Redis unavailable for rate limiting, using in-memory fallback"
                );
                return self.fallback.check(key, config).await;
            }
        };

        let window_ms = u64::try_from(config.window.as_millis()).unwrap_or(u64::MAX);
        let script = redis::Script::new(FIXED_WINDOW_SCRIPT);
        let outcome: redis::RedisResult<(i64, i64, i64)> = script
            .key(&full_key)
            .arg(config.max_requests)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await;

        let (allowed, count, ttl_ms) = match outcome {
            Ok(values) => values,
            Err(e) => {
                warn!(
                    error = %e,
                    key = %full_key,
                    "Rate limit script failed, using in-memory fallback"
                );
                return self.fallback.check(key, config).await;
            }
        };

        let until_reset = ceil_secs(Duration::from_millis(ttl_ms.max(1) as u64));

        if allowed == 1 {
            let remaining = i64::from(config.max_requests).saturating_sub(count).max(0) as u32;
            debug!(key = %full_key, remaining = remaining, "Rate limit check passed");
            Ok(Allowance {
                remaining,
                reset_secs: until_reset,
            })
        } else {
            debug!(key = %full_key, retry_after = until_reset, "Rate limit exceeded");
            Err(until_reset)
        }
    }
}

/// Extract client IP from the socket address, or from proxy headers when trusted
pub fn extract_client_ip(
    headers: &HeaderMap,
    peer: Option<&SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<IpAddr> {
    if !trust_proxy_headers {
        return peer.map(SocketAddr::ip);
    }

    // X-Forwarded-For can contain a chain; the first entry is the client
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
    if forwarded.is_some() {
        return forwarded;
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
    if real_ip.is_some() {
        return real_ip;
    }

    peer.map(SocketAddr::ip)
}

/// Compute the limiter key for a request
pub fn rate_limit_key(request: &Request, trust_proxy_headers: bool) -> String {
    if let Some(context) = request.extensions().get::<AuthContext>() {
        return format!("user:{}", context.account.id);
    }

    if let Some(service) = request.extensions().get::<ServicePrincipal>() {
        return format!("service:{}", service.key_fingerprint);
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr);

    match extract_client_ip(request.headers(), peer, trust_proxy_headers) {
        Some(ip) => format!("ip:{}", ip),
        None => {
            warn!("Could not determine client IP for rate limiting");
            "ip:unknown".to_string()
        }
    }
}

/// State for [`rate_limit`]
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(limiter: RateLimiter, config: RateLimitConfig) -> Self {
        Self { limiter, config }
    }
}

/// Axum middleware: enforce the configured limit
pub async fn rate_limit(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = rate_limit_key(&request, state.limiter.trusts_proxy_headers());

    match state.limiter.check(&key, &state.config).await {
        Ok(allowance) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();

            // Nested limits: the innermost (most specific) one reports
            if headers.contains_key("x-ratelimit-limit") {
                return Ok(response);
            }

            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(state.config.max_requests),
            );
            headers.insert(
                "x-ratelimit-remaining",
                HeaderValue::from(allowance.remaining),
            );
            headers.insert("x-ratelimit-reset", HeaderValue::from(allowance.reset_secs));
            Ok(response)
        }
        Err(retry_after) => {
            warn!(
                key = %key,
                prefix = %state.config.key_prefix,
                retry_after = retry_after,
                "Rate limit exceeded"
            );
            Err(ApiError::RateLimited { retry_after })
        }
    }
}
