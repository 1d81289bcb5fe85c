//! Request and Response models for the boundary server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! parsing path parameters and serializing HTTP response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::DepartmentCode;
pub use responses::{
    ClearResponse, ErrorResponse, FamilyStatsResponse, HealthResponse, StatsResponse,
};
