//! Cache Statistics Module
//!
//! Tracks per-family cache activity: hits, misses, productions, and failures.

use serde::Serialize;

// == Cache Stats ==
/// Counters for one cache family.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Requests answered from a fresh entry
    pub hits: u64,
    /// Requests that found no entry or a stale one
    pub misses: u64,
    /// Successful producer invocations
    pub productions: u64,
    /// Failed producer invocations
    pub failures: u64,
    /// Entries currently held, stale ones included
    pub entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_production(&mut self) {
        self.productions += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }
}
