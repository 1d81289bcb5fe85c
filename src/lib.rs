//! Geo Boundaries - GeoJSON server for administrative boundaries
//!
//! Serves department and municipality boundaries read from GeoPackage
//! datasets, kept in a lazy TTL cache and fetched from object storage when
//! a dataset is not available locally.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod remote;
pub mod service;

pub use api::AppState;
pub use config::Config;
pub use service::BoundaryService;
