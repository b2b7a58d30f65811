//! # Dealboard HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Snapshot status (pipeline, generation, counts)
//! - `GET /snapshot` - Pipelines, users, and stages for the frontend
//! - `GET /metrics` - Computed metrics, optionally filtered by `?user_id=`
//! - `GET /breakdown` - Deal counts per assignee
//! - `POST /refresh` - Re-fetch the snapshot from the upstream CRM
//! - `POST /deal` - Proxy a single-deal lookup to the upstream CRM
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `DEALBOARD_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `DEALBOARD_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `DEALBOARD_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::get_api_key_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `dealboard::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    breakdown_handler, deal_proxy_handler, health_handler, metrics_handler, refresh_handler,
    snapshot_handler, status_handler,
};
#[allow(unused_imports)]
pub use types::{
    BreakdownEntry, BreakdownResponse, ErrorResponse, HealthResponse, MetricsQuery,
    MetricsResponse, PipelineJson, RefreshRequest, RefreshResponse, SnapshotResponse, StageJson,
    StatusResponse, UserJson,
};

use crate::crm::CrmClient;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{any, get, post},
};
use dealboard_core::{Dashboard, DealboardError, MetricSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the snapshot, the upstream client, and the
/// metric table, all cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// The current dashboard snapshot.
    pub dashboard: Arc<RwLock<Dashboard>>,
    /// Client for the upstream CRM REST API.
    pub client: CrmClient,
    /// Metric definitions the aggregation runs over.
    pub metrics: Arc<MetricSet>,
}

impl AppState {
    /// Create new app state from a snapshot, a client, and a metric table.
    #[must_use]
    pub fn new(dashboard: Dashboard, client: CrmClient, metrics: MetricSet) -> Self {
        Self {
            dashboard: Arc::new(RwLock::new(dashboard)),
            client,
            metrics: Arc::new(metrics),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `DEALBOARD_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("DEALBOARD_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (DEALBOARD_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            // Parse comma-separated origins
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in DEALBOARD_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No DEALBOARD_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against DoS (if enabled)
/// 4. Authentication - validates API key (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Check if authentication is enabled
    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set DEALBOARD_API_KEY environment variable to enable authentication."
        );
    }

    // Build base router with routes. The /deal route takes any method so
    // the handler itself can answer non-POST with a JSON 405 body.
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/snapshot", get(handlers::snapshot_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/breakdown", get(handlers::breakdown_handler))
        .route("/refresh", post(handlers::refresh_handler))
        .route("/deal", any(handlers::deal_proxy_handler));

    // Apply authentication middleware (innermost - runs last on request)
    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), DealboardError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DealboardError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Dealboard HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| DealboardError::IoError(format!("Server error: {}", e)))
}
