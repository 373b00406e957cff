//! # CiteRank HTTP API Module
//!
//! Read-only REST API over a built rank database.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Node, edge and dangling counts of the last build
//! - `GET /papers/top?limit=N` - Highest-ranked papers (limit capped at 1000)
//! - `GET /papers/{id}` - One paper with its stored details
//! - `GET /papers/{id}/citations` - Citing and cited neighbours of a paper
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `CITERANK_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `CITERANK_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `CITERANK_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{get_api_key_from_env, keys_match};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    CitationsResponse, ErrorResponse, HealthResponse, MAX_TOP_LIMIT, PaperJson, PaperResponse,
    StatusResponse, TopQuery, TopResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use citerank_core::{CiteRankError, RankDatabase};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state. The database is only ever read.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RankDatabase>,
}

impl AppState {
    #[must_use]
    pub fn new(db: RankDatabase) -> Self {
        Self { db: Arc::new(db) }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `CITERANK_CORS_ORIGINS`.
///
/// - `*`: allow all origins
/// - unset, or no valid origin in the list: localhost only
/// - otherwise: the comma-separated origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("CITERANK_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (CITERANK_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
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
                    "CORS: No valid origins in CITERANK_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No CITERANK_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Rate limiting (if enabled)
/// 4. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED. Set CITERANK_API_KEY to require a bearer key."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/papers/top", get(handlers::top_handler))
        .route("/papers/{id}", get(handlers::paper_handler))
        .route("/papers/{id}/citations", get(handlers::citations_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the API for `db` on `addr` until the process is stopped.
pub async fn run_server(addr: &str, db: RankDatabase) -> Result<(), CiteRankError> {
    let router = create_router(AppState::new(db));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CiteRankError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("CiteRank HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| CiteRankError::IoError(format!("Server error: {}", e)))
}
