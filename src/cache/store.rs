//! TTL Store Module
//!
//! Keyed storage of produced values and their timestamps. Freshness is never
//! evaluated here; the orchestrator decides whether an entry may be served.

use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::CacheEntry;

// == TTL Store ==
/// Keyed store mapping a cache key to its latest entry.
///
/// There is no background expiry: stale entries stay until they are replaced
/// by a fresh production or dropped by [`TtlStore::clear`].
#[derive(Debug)]
pub struct TtlStore<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V> TtlStore<K, V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    // == Get ==
    /// Returns the entry for `key` regardless of its age.
    pub fn get(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Put ==
    /// Inserts or replaces the entry for `key`, stamped with the current time.
    ///
    /// Returns the entry that was stored so callers can hand out its value.
    pub fn put(&mut self, key: K, value: V) -> &CacheEntry<V> {
        use std::collections::hash_map::Entry;

        let entry = CacheEntry::new(value);
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.insert(entry);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entry),
        }
    }

    // == Clear ==
    /// Removes every entry, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    // == Length ==
    /// Returns the current number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V> Default for TtlStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
