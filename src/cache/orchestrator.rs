//! Cache Orchestrator Module
//!
//! Serves fresh entries from a [`TtlStore`] and runs a producer on miss or
//! staleness. Concurrent misses for the same key wait behind one in-flight
//! production instead of producing in parallel.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, TtlStore};
use crate::error::Result;

type GateMap<K> = Mutex<HashMap<K, Arc<AsyncMutex<()>>>>;

// == Cache Orchestrator ==
/// Owns one cache family and decides between serving and producing.
#[derive(Debug)]
pub struct CacheOrchestrator<K, V> {
    /// Family name used in log output
    name: &'static str,
    store: RwLock<TtlStore<K, V>>,
    /// Per-key production gates, present only while a key is being produced
    gates: GateMap<K>,
    /// Bumped by every clear; productions started earlier are not stored
    generation: AtomicU64,
    stats: Mutex<CacheStats>,
}

impl<K, V> CacheOrchestrator<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    // == Constructor ==
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            store: RwLock::new(TtlStore::new()),
            gates: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            stats: Mutex::new(CacheStats::new()),
        }
    }

    // == Get Or Produce ==
    /// Returns the cached value for `key` if it is younger than `ttl`,
    /// otherwise awaits `producer` and caches its result.
    ///
    /// A failed production leaves any existing entry untouched and is
    /// returned to the caller; errors are never cached. A value whose
    /// production overlapped a [`clear`](Self::clear) is returned to this
    /// caller but not stored.
    pub async fn get_or_produce<F, Fut>(&self, key: K, ttl: Duration, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.lookup_fresh(&key, ttl).await {
            self.record(CacheStats::record_hit);
            debug!(cache = self.name, key = ?key, "cache hit");
            return Ok(value);
        }
        self.record(CacheStats::record_miss);

        let gate = self.gate(&key);
        let _permit = gate.lock.lock().await;

        // Another request may have produced the value while we waited.
        if let Some(value) = self.lookup_fresh(&key, ttl).await {
            debug!(cache = self.name, key = ?key, "served by concurrent production");
            return Ok(value);
        }

        let generation = self.generation.load(AtomicOrdering::Acquire);
        match producer().await {
            Ok(value) => {
                let mut store = self.store.write().await;
                if self.generation.load(AtomicOrdering::Acquire) == generation {
                    let entry = store.put(key.clone(), value.clone());
                    info!(
                        cache = self.name,
                        key = ?key,
                        produced_at = %entry.produced_at_utc.to_rfc3339(),
                        "cached fresh value"
                    );
                } else {
                    debug!(
                        cache = self.name,
                        key = ?key,
                        "cache cleared during production, value not stored"
                    );
                }
                drop(store);
                self.record(CacheStats::record_production);
                Ok(value)
            }
            Err(err) => {
                self.record(CacheStats::record_failure);
                warn!(cache = self.name, key = ?key, error = %err, "production failed");
                Err(err)
            }
        }
    }

    // == Clear ==
    /// Drops every entry of this family, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut store = self.store.write().await;
        self.generation.fetch_add(1, AtomicOrdering::AcqRel);
        let removed = store.clear();
        drop(store);
        info!(cache = self.name, removed, "cache family cleared");
        removed
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let entries = self.store.read().await.len();
        let mut stats = self.lock_stats().clone();
        stats.entries = entries;
        stats
    }

    async fn lookup_fresh(&self, key: &K, ttl: Duration) -> Option<V> {
        let store = self.store.read().await;
        store
            .get(key)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.value.clone())
    }

    fn gate(&self, key: &K) -> Gate<'_, K> {
        let mut gates = lock_ignoring_poison(&self.gates);
        let lock = gates.entry(key.clone()).or_default().clone();
        Gate {
            gates: &self.gates,
            key: key.clone(),
            lock,
        }
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        update(&mut self.lock_stats());
    }

    fn lock_stats(&self) -> MutexGuard<'_, CacheStats> {
        lock_ignoring_poison(&self.stats)
    }
}

// == Gate ==
/// Shared handle on a key's production lock; the last holder removes it
/// from the gate map.
struct Gate<'a, K: Eq + Hash> {
    gates: &'a GateMap<K>,
    key: K,
    lock: Arc<AsyncMutex<()>>,
}

impl<K: Eq + Hash> Drop for Gate<'_, K> {
    fn drop(&mut self) {
        let mut gates = lock_ignoring_poison(self.gates);
        // One reference lives in the map, one in this handle.
        if Arc::strong_count(&self.lock) == 2 {
            gates.remove(&self.key);
        }
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
