//! Cache Store Module
//!
//! Capacity-bounded LRU cache combining HashMap storage with LRU tracking
//! and per-entry cost accounting.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{ByteWeigher, CacheEntry, CacheStats, CountWeigher, LruTracker, Weigher};

// == LRU Cache ==
/// Key-value cache bounded by a total cost budget, evicting least recently used entries.
///
/// The weigher decides what the budget means: `CountWeigher` turns it into
/// an entry count, `ByteWeigher` into a byte size. Invariants after every call:
/// - `current_cost` is the sum of resident entry costs
/// - `current_cost <= capacity`
#[derive(Debug)]
pub struct LruCache<V, W = CountWeigher> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum total cost, fixed at construction
    capacity: usize,
    /// Sum of the costs of resident entries
    current_cost: usize,
    weigher: W,
}

/// Item-count-bounded cache.
pub type CountLruCache<V> = LruCache<V, CountWeigher>;

/// Byte-size-bounded cache.
pub type ByteLruCache<V> = LruCache<V, ByteWeigher>;

impl<V, W: Weigher<V> + Default> LruCache<V, W> {
    // == Constructor ==
    /// Creates an empty cache with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self::with_weigher(capacity, W::default())
    }
}

impl<V, W: Weigher<V>> LruCache<V, W> {
    pub fn with_weigher(capacity: usize, weigher: W) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(capacity),
            capacity,
            current_cost: 0,
            weigher,
        }
    }

    // == Get ==
    /// Retrieves a value by key, marking it most recently used on a hit.
    ///
    /// A miss leaves the recency order untouched.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        match self.entries.get(key) {
            Some(entry) => {
                self.lru.touch(key);
                self.stats.record_hit();
                Some(&entry.value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Inserts or replaces a value, making it the most recently used entry.
    ///
    /// Least recently used entries are evicted until the new value fits.
    /// A value whose own cost exceeds the capacity is never admitted: the
    /// cache is left unchanged and `false` is returned.
    pub fn set(&mut self, key: String, value: V) -> bool {
        let cost = self.weigher.weigh(&value);
        if cost > self.capacity {
            self.stats.record_rejection();
            debug!(
                "Cache rejected '{}': cost {} exceeds capacity {}",
                key, cost, self.capacity
            );
            return false;
        }

        // Replacing a resident key releases its old cost first
        if let Some(previous) = self.entries.remove(&key) {
            self.current_cost -= previous.cost;
            self.lru.remove(&key);
        }

        while self.current_cost + cost > self.capacity {
            let Some(evicted_key) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&evicted_key) {
                self.current_cost -= evicted.cost;
            }
            self.stats.record_eviction();
            debug!("Cache evicted '{}'", evicted_key);
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, cost));
        self.current_cost += cost;
        self.sync_occupancy();

        true
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.current_cost -= entry.cost;
                self.lru.remove(key);
                self.sync_occupancy();
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.current_cost = 0;
        self.sync_occupancy();
    }

    /// Checks residency without touching recency or stats.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Resident keys from least to most recently used.
    pub fn keys_oldest_first(&self) -> impl Iterator<Item = &str> {
        self.lru.iter_oldest_first()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current_cost(&self) -> usize {
        self.current_cost
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sync_occupancy(&mut self) {
        self.stats.set_occupancy(self.entries.len(), self.current_cost);
    }

    /// Recomputes the resident cost from scratch.
    #[cfg(test)]
    pub(crate) fn resident_cost(&self) -> usize {
        self.entries.values().map(|entry| entry.cost).sum()
    }
}
