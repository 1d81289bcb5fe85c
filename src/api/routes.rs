//! API Routes
//!
//! Configures the Axum router with all boundary server endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, departments_handler, health_handler, municipalities_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/departments` - All departments as a FeatureCollection
/// - `GET /api/municipalities/:code` - Municipalities of one department
/// - `DELETE /api/cache` - Invalidate every cached collection
/// - `GET /api/cache/stats` - Cache counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/departments", get(departments_handler))
        .route("/api/municipalities/:code", get(municipalities_handler))
        .route("/api/cache", delete(clear_cache_handler))
        .route("/api/cache/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
