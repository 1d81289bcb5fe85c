//! API Handlers
//!
//! HTTP request handlers for each boundary server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::models::{ClearResponse, DepartmentCode, HealthResponse, StatsResponse};
use crate::service::{BoundaryService, SharedCollection};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache facade over the boundary datasets
    pub service: Arc<BoundaryService>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(service: BoundaryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(BoundaryService::from_config(config.clone())?))
    }
}

/// Handler for GET /api/departments
pub async fn departments_handler(
    State(state): State<AppState>,
) -> Result<Json<SharedCollection>> {
    let collection = state.service.departments().await?;
    Ok(Json(collection))
}

/// Handler for GET /api/municipalities/:code
pub async fn municipalities_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SharedCollection>> {
    let code = DepartmentCode::parse(&code)?;
    let collection = state.service.municipalities(&code).await?;
    Ok(Json(collection))
}

/// Handler for DELETE /api/cache
///
/// Invalidates both cache families.
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.service.invalidate_all().await;
    Json(ClearResponse::new(cleared))
}

/// Handler for GET /api/cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let (departments, municipalities) = state.service.stats().await;
    Json(StatsResponse::new(
        state.service.ttl().as_secs(),
        departments,
        municipalities,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
