//! Response DTOs for the boundary server API
//!
//! Defines the structure of outgoing HTTP response bodies other than the
//! feature collections themselves.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the invalidation operation (DELETE /api/cache)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Number of entries dropped across both cache families
    pub cleared: usize,
}

impl ClearResponse {
    /// Creates a new ClearResponse
    pub fn new(cleared: usize) -> Self {
        Self {
            message: "Cache cleared".to_string(),
            cleared,
        }
    }
}

/// Counters for a single cache family
#[derive(Debug, Clone, Serialize)]
pub struct FamilyStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub productions: u64,
    pub failures: u64,
    pub entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for FamilyStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            productions: stats.productions,
            failures: stats.failures,
            entries: stats.entries,
        }
    }
}

/// Response body for the stats endpoint (GET /api/cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub ttl_seconds: u64,
    pub departments: FamilyStatsResponse,
    pub municipalities: FamilyStatsResponse,
}

impl StatsResponse {
    pub fn new(ttl_seconds: u64, departments: CacheStats, municipalities: CacheStats) -> Self {
        Self {
            ttl_seconds,
            departments: departments.into(),
            municipalities: municipalities.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Human-readable summary
    pub error: String,
    /// Machine-readable error kind
    pub kind: String,
    /// Underlying cause, when there is one worth reporting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>, kind: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
            details,
        }
    }
}
