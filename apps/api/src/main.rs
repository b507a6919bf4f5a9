use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use journey_api::config::Config;
use journey_api::middleware::{
    RateLimiter, ServiceKeys, ADMIN_ID_HEADER, API_KEY_HEADER, USER_ID_HEADER,
};
use journey_api::repositories::{PgAccountRepository, PgAdminRepository, PgMembershipRepository};
use journey_api::routes::{health_router, HealthState};
use journey_api::services::HealthService;
use journey_api::{api_router, AppState, TokenConfig, TokenService};

/// Build the CORS layer based on configuration.
///
/// In production mode:
/// - If `CORS_ORIGINS` is set, only those origins are allowed
/// - If `CORS_ORIGINS` is not set, CORS requests are rejected (no origins allowed)
///
/// In development mode:
/// - If `CORS_ORIGINS` is set, those origins are used
/// - If `CORS_ORIGINS` is not set, permissive CORS is used for convenience
fn build_cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                return CorsLayer::new();
            }

            tracing::info!(
                "CORS configured with {} allowed origin(s): {:?}",
                allowed_origins.len(),
                origins
            );
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::ORIGIN,
                    HeaderName::from_static(USER_ID_HEADER),
                    HeaderName::from_static(ADMIN_ID_HEADER),
                    HeaderName::from_static(API_KEY_HEADER),
                ])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        }
        _ if config.is_production() => {
            tracing::warn!(
                "CORS_ORIGINS not configured in production mode. \
                 CORS requests will be rejected. Set CORS_ORIGINS to allow cross-origin requests."
            );
            CorsLayer::new()
        }
        _ => {
            tracing::warn!(
                "Using permissive CORS in development mode. \
                 Set CORS_ORIGINS for production-like behavior."
            );
            CorsLayer::permissive()
        }
    }
}

/// Open and ping Redis, returning `None` if it is not configured or unreachable
async fn connect_redis(config: &Config) -> Option<redis::Client> {
    let redis_config = config.redis()?;

    let client = match redis::Client::open(redis_config.connection_url().as_str()) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Redis client creation failed, using in-memory rate limits");
            return None;
        }
    };

    match client.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
            if pong.is_ok() {
                tracing::info!("Redis connected for rate limiting");
                Some(client)
            } else {
                tracing::warn!("Redis ping failed, using in-memory rate limits");
                None
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis connection failed, using in-memory rate limits");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journey_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing::info!(
        environment = %config.environment(),
        "Starting Journey API server on port {}",
        config.port
    );

    tracing::info!("Connecting to database...");
    let database = config.database();
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            database.connect_timeout_secs,
        ))
        .connect(&database.url)
        .await?;
    tracing::info!("Database connection established");

    if database.run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations completed successfully");
    }

    let redis_client = connect_redis(&config).await;

    let limiter = match redis_client.clone() {
        Some(client) => RateLimiter::with_redis(client),
        None => {
            tracing::warn!(
                "Rate limits are per instance - configure REDIS_URL to share them across instances"
            );
            RateLimiter::new()
        }
    };

    let tokens = TokenService::new(
        TokenConfig::new(config.jwt_secret.clone())
            .with_issuer(config.jwt_issuer.clone())
            .with_expiry_string(&config.jwt_expiry),
    );

    if !config.identity_header_trusted {
        tracing::info!("{} header disabled, bearer tokens required", USER_ID_HEADER);
    }

    let service_keys = ServiceKeys::new(&config.service_api_keys);
    if service_keys.is_empty() {
        tracing::warn!("SERVICE_API_KEYS not set, service routes will reject every caller");
    } else {
        tracing::info!("{} service API key(s) configured", service_keys.len());
    }

    let state = AppState::new(
        Arc::new(PgAccountRepository::new(pool.clone())),
        Arc::new(PgMembershipRepository::new(pool.clone())),
        Arc::new(PgAdminRepository::new(pool.clone())),
        tokens,
    )
    .with_identity_header_trusted(config.identity_header_trusted)
    .with_service_keys(service_keys)
    .with_rate_limiter(limiter)
    .with_proxy_headers_trusted(config.trust_proxy_headers);

    let health_state = HealthState::new(HealthService::new(pool, redis_client));

    let cors_layer = build_cors_layer(&config);

    let app = Router::new()
        .route("/", axum::routing::get(root))
        // Nested health routes: /health, /health/live, /health/ready
        .nest("/health", health_router(health_state))
        .merge(api_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    // Run the server with ConnectInfo so rate limits can key on the peer address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn root() -> &'static str {
    "People Power Journey API"
}
