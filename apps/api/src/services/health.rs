//! Health check service for verifying external dependencies
//!
//! Checks the PostgreSQL pool the access-control layer depends on and, when
//! configured, the Redis instance backing shared rate limits.

use std::time::{Duration, Instant};

use serde::Serialize;
use sqlx::PgPool;

/// Status of an individual service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Service is healthy and responding
    Healthy,
    /// Service is unhealthy or unreachable
    Unhealthy,
    /// Service check was skipped (optional service not configured)
    Skipped,
}

/// Result of a single service health check
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    /// Name of the service
    pub name: &'static str,
    /// Current status
    pub status: ServiceStatus,
    /// Response time in milliseconds (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    /// Create a healthy service result
    pub fn healthy(name: &'static str, response_time: Duration) -> Self {
        Self {
            name,
            status: ServiceStatus::Healthy,
            response_time_ms: Some(response_time.as_millis() as u64),
            error: None,
        }
    }

    /// Create an unhealthy service result
    pub fn unhealthy(name: &'static str, error: impl Into<String>) -> Self {
        Self {
            name,
            status: ServiceStatus::Unhealthy,
            response_time_ms: None,
            error: Some(error.into()),
        }
    }

    /// Create a skipped service result
    pub fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: ServiceStatus::Skipped,
            response_time_ms: None,
            error: None,
        }
    }
}

/// Aggregated health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResponse {
    /// Overall status (healthy only if every checked service is healthy)
    pub status: ServiceStatus,
    /// Individual service health results
    pub services: Vec<ServiceHealth>,
    /// Total time to complete all health checks
    pub total_time_ms: u64,
    /// API version
    pub version: &'static str,
}

impl HealthCheckResponse {
    /// Create a new health check response from individual service results
    pub fn new(services: Vec<ServiceHealth>, total_time: Duration) -> Self {
        let status = if services
            .iter()
            .all(|s| s.status != ServiceStatus::Unhealthy)
        {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        };

        Self {
            status,
            services,
            total_time_ms: total_time.as_millis() as u64,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Check if overall health is good
    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

/// Health check service for verifying external dependencies
#[derive(Clone)]
pub struct HealthService {
    pool: PgPool,
    redis: Option<redis::Client>,
}

impl HealthService {
    /// Create a new health service
    pub fn new(pool: PgPool, redis: Option<redis::Client>) -> Self {
        Self { pool, redis }
    }

    /// Check PostgreSQL connectivity through the shared pool
    pub async fn check_database(&self) -> ServiceHealth {
        let start = Instant::now();

        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => ServiceHealth::healthy("database", start.elapsed()),
            Err(e) => ServiceHealth::unhealthy("database", format!("Query failed: {}", e)),
        }
    }

    /// Check Redis connectivity, if Redis is configured
    pub async fn check_redis(&self) -> ServiceHealth {
        let Some(client) = &self.redis else {
            return ServiceHealth::skipped("redis");
        };
        let start = Instant::now();

        let mut conn = match client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => return ServiceHealth::unhealthy("redis", format!("Connection failed: {}", e)),
        };

        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) if response == "PONG" => ServiceHealth::healthy("redis", start.elapsed()),
            Ok(response) => {
                ServiceHealth::unhealthy("redis", format!("Unexpected PING response: {}", response))
            }
            Err(e) => ServiceHealth::unhealthy("redis", format!("PING failed: {}", e)),
        }
    }

    /// Run all checks concurrently
    pub async fn check_all(&self) -> HealthCheckResponse {
        let start = Instant::now();
        let (database, redis) = tokio::join!(self.check_database(), self.check_redis());
        HealthCheckResponse::new(vec![database, redis], start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_services_do_not_fail_overall_status() {
        let response = HealthCheckResponse::new(
            vec![
                ServiceHealth::healthy("database", Duration::from_millis(3)),
                ServiceHealth::skipped("redis"),
            ],
            Duration::from_millis(4),
        );
        assert!(response.is_healthy());
    }

    #[test]
    fn test_unhealthy_service_fails_overall_status() {
        let response = HealthCheckResponse::new(
            vec![
                ServiceHealth::unhealthy("database", "Connection refused"),
                ServiceHealth::skipped("redis"),
            ],
            Duration::from_millis(4),
        );
        assert!(!response.is_healthy());
        assert_eq!(response.status, ServiceStatus::Unhealthy);
    }

    #[test]
    fn test_service_health_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ServiceHealth::skipped("redis")).unwrap();
        assert_eq!(json["status"], "skipped");
        assert!(json.get("error").is_none());
        assert!(json.get("response_time_ms").is_none());
    }
}
