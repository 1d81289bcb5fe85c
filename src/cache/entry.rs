//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with production timestamps.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// A materialized value together with the moment it was produced.
///
/// Entries are never mutated after creation; an update replaces the entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Monotonic production instant, used for freshness checks
    pub produced_at: Instant,
    /// Wall-clock production time, for logs and diagnostics
    pub produced_at_utc: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: V) -> Self {
        Self {
            value,
            produced_at: Instant::now(),
            produced_at_utc: Utc::now(),
        }
    }

    // == Age ==
    /// Time elapsed since the value was produced.
    pub fn age(&self) -> Duration {
        self.produced_at.elapsed()
    }

    // == Is Fresh ==
    /// Checks whether the entry may still be served.
    ///
    /// Boundary condition: an entry whose age equals the TTL is stale, so a
    /// zero TTL never serves from cache.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}
