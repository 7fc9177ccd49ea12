//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch stamps the key with a fresh, strictly increasing tick:
/// - Lowest tick = Least recently used
/// - Highest tick = Most recently used
///
/// Touch, remove and eviction are all logarithmic in the number of keys.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Keys ordered by their last access tick
    order: BTreeMap<u64, String>,
    /// Last access tick of each tracked key
    ticks: HashMap<String, u64>,
    /// Tick handed out by the next touch
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// Tracked keys are moved to the most recent end, new keys are added there.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        match self.ticks.get_mut(key) {
            Some(previous) => {
                if let Some(owned) = self.order.remove(&*previous) {
                    self.order.insert(tick, owned);
                }
                *previous = tick;
            }
            None => {
                self.order.insert(tick, key.to_string());
                self.ticks.insert(key.to_string(), tick);
            }
        }
    }

    // == Remove ==
    /// Removes a key from the tracker. Returns whether it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.ticks.remove(key) {
            Some(tick) => {
                self.order.remove(&tick);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.first_key_value().map(|(_, key)| key.as_str())
    }

    /// Iterates keys from least to most recently used.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
        self.ticks.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_new_key() {
        let mut lru = LruTracker::new();

        lru.touch("file-1");
        lru.touch("file-2");
        lru.touch("file-3");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("file-1"));
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch("file-1");
        lru.touch("file-2");
        lru.touch("file-3");
        lru.touch("file-1");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("file-2"));
    }

    #[test]
    fn test_lru_evict_oldest() {
        let mut lru = LruTracker::new();

        lru.touch("file-1");
        lru.touch("file-2");
        lru.touch("file-3");

        assert_eq!(lru.evict_oldest(), Some("file-1".to_string()));
        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("file-1"));

        assert_eq!(lru.evict_oldest(), Some("file-2".to_string()));
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_lru_evict_empty() {
        let mut lru = LruTracker::new();
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        assert!(lru.remove("b"));
        assert!(!lru.remove("b"));

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("b"));
        assert!(lru.contains("a"));
        assert!(lru.contains("c"));
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        // a, c, b is now the access order from oldest to newest
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        assert_eq!(lru.iter_oldest_first().collect::<Vec<_>>(), ["a", "c", "b"]);
        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("a");
        lru.touch("a");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.peek_oldest(), None);

        // Tracker stays usable after a clear
        lru.touch("c");
        assert_eq!(lru.peek_oldest(), Some("c"));
    }
}
