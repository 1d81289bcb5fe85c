//! Cache Module
//!
//! Lazy, time-expiring caching of produced values. Staleness is evaluated at
//! read time; there is no background eviction.

mod entry;
mod orchestrator;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use orchestrator::CacheOrchestrator;
pub use stats::CacheStats;
pub use store::TtlStore;

// == Public Constants ==
/// Default time-to-live for every cached family (5 minutes)
pub const DEFAULT_TTL_SECS: u64 = 300;
