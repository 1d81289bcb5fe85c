//! API Module
//!
//! HTTP handlers and routing for the boundary server REST API.
//!
//! # Endpoints
//! - `GET /api/departments` - All departments
//! - `GET /api/municipalities/:code` - Municipalities of one department
//! - `DELETE /api/cache` - Invalidate both cache families
//! - `GET /api/cache/stats` - Cache counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
