//! Eviction Store Module
//!
//! Byte-accounted LRU map: HashMap storage combined with an O(1) recency list.

use std::collections::HashMap;
use std::fmt;

use crate::cache::lru::{LruList, Slot};
use crate::cache::CacheStats;

/// Callback invoked with every entry evicted under capacity pressure.
///
/// Runs while the owning cache lock is held, so it must not call back into
/// the same cache.
pub type OnEvicted = Box<dyn Fn(&str, &[u8]) + Send + Sync>;

#[derive(Debug)]
struct StoredValue {
    value: Vec<u8>,
    slot: Slot,
}

// == Eviction Store ==
/// Bounded LRU map that accounts `len(key) + len(value)` bytes per entry.
///
/// After every mutation `max_bytes == 0 || current_bytes <= max_bytes`.
pub struct EvictionStore {
    entries: HashMap<String, StoredValue>,
    order: LruList,
    /// Byte limit, 0 = unbounded
    max_bytes: usize,
    current_bytes: usize,
    on_evicted: Option<OnEvicted>,
    stats: CacheStats,
}

impl fmt::Debug for EvictionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionStore")
            .field("entries", &self.entries.len())
            .field("max_bytes", &self.max_bytes)
            .field("current_bytes", &self.current_bytes)
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}

fn entry_size(key: &str, value: &[u8]) -> usize {
    key.len() + value.len()
}

impl EvictionStore {
    // == Constructor ==
    /// Creates a store holding at most `max_bytes` (0 = unbounded).
    pub fn new(max_bytes: usize, on_evicted: Option<OnEvicted>) -> Self {
        Self {
            entries: HashMap::new(),
            order: LruList::new(),
            max_bytes,
            current_bytes: 0,
            on_evicted,
            stats: CacheStats::new(),
        }
    }

    // == Get ==
    /// Returns a copy of the value and marks the entry most recently used.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        match self.entries.get(key) {
            Some(stored) => {
                self.order.move_to_front(stored.slot);
                self.stats.record_hit();
                Some(stored.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Inserts or updates an entry, then evicts from the back while over budget.
    ///
    /// An entry larger than `max_bytes` on its own is evicted immediately.
    pub fn set(&mut self, key: String, value: Vec<u8>) {
        if let Some(stored) = self.entries.get_mut(&key) {
            self.current_bytes = self.current_bytes - stored.value.len() + value.len();
            stored.value = value;
            self.order.move_to_front(stored.slot);
        } else {
            self.current_bytes += entry_size(&key, &value);
            let slot = self.order.push_front(key.clone());
            self.entries.insert(key, StoredValue { value, slot });
        }

        while self.max_bytes != 0 && self.current_bytes > self.max_bytes {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    // == Remove ==
    /// Deletes the entry if present, releasing its bytes.
    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        let stored = self.entries.remove(key)?;
        self.order.remove(stored.slot);
        self.current_bytes -= entry_size(key, &stored.value);
        Some(stored.value)
    }

    // == Get All ==
    /// Point-in-time copy of every live entry, in no particular order.
    pub fn get_all(&self) -> HashMap<String, Vec<u8>> {
        self.entries
            .iter()
            .map(|(key, stored)| (key.clone(), stored.value.clone()))
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_usage(self.entries.len(), self.current_bytes, self.max_bytes);
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_bytes(&self) -> usize {
        self.current_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.order.keys().into_iter().map(str::to_string).collect()
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(key) = self.order.pop_back() else {
            return false;
        };
        if let Some(stored) = self.entries.remove(&key) {
            self.current_bytes -= entry_size(&key, &stored.value);
            self.stats.record_eviction();
            if let Some(callback) = &self.on_evicted {
                callback(&key, &stored.value);
            }
        }
        true
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn set(store: &mut EvictionStore, key: &str, value: &str) {
        store.set(key.to_string(), value.as_bytes().to_vec());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = EvictionStore::new(0, None);
        set(&mut store, "key1", "value1");
        set(&mut store, "key2", "value2");

        assert_eq!(store.get("key1"), Some(b"value1".to_vec()));
        assert_eq!(store.get("key2"), Some(b"value2".to_vec()));
        assert_eq!(store.get("miss key"), None);
        assert_eq!(store.current_bytes(), 20);
    }

    #[test]
    fn test_store_evicts_back_when_over_budget() {
        let mut store = EvictionStore::new("key1value1key2value2".len(), None);
        set(&mut store, "key1", "value1");
        set(&mut store, "key2", "value2");
        set(&mut store, "k3", "v3");

        assert_eq!(store.get("key1"), None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys_by_recency()[0], "k3");
        assert!(store.current_bytes() <= store.max_bytes());
    }

    #[test]
    fn test_store_on_evicted_callback() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = evicted.clone();
        let callback: OnEvicted = Box::new(move |key, value| {
            sink.lock().unwrap().push((key.to_string(), value.to_vec()));
        });

        let mut store = EvictionStore::new("key1value1".len(), Some(callback));
        set(&mut store, "key1", "value1");
        set(&mut store, "key2", "value2");

        let evicted = evicted.lock().unwrap();
        assert_eq!(*evicted, vec![("key1".to_string(), b"value1".to_vec())]);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_update_adjusts_bytes_and_recency() {
        let mut store = EvictionStore::new(0, None);
        set(&mut store, "a", "1");
        set(&mut store, "b", "2");
        set(&mut store, "a", "12345");

        assert_eq!(store.len(), 2);
        assert_eq!(store.current_bytes(), 1 + 5 + 1 + 1);
        assert_eq!(store.keys_by_recency(), vec!["a", "b"]);
    }

    #[test]
    fn test_store_get_touches_entry() {
        let mut store = EvictionStore::new(6, None);
        set(&mut store, "a", "1");
        set(&mut store, "b", "2");
        set(&mut store, "c", "3");

        // Make "a" most recently used, then overflow
        store.get("a");
        set(&mut store, "d", "4");

        assert!(store.get("a").is_some());
        assert!(store.get("b").is_none());
    }

    #[test]
    fn test_store_remove_releases_bytes() {
        let mut store = EvictionStore::new(0, None);
        set(&mut store, "key1", "value1");
        set(&mut store, "key2", "value2");

        assert_eq!(store.remove("key1"), Some(b"value1".to_vec()));
        assert_eq!(store.current_bytes(), 10);
        assert_eq!(store.remove("key1"), None);
        assert_eq!(store.current_bytes(), 10);
        assert_eq!(store.keys_by_recency(), vec!["key2"]);
    }

    #[test]
    fn test_store_oversized_entry_is_evicted() {
        let mut store = EvictionStore::new(4, None);
        set(&mut store, "key", "too-large");

        assert!(store.is_empty());
        assert_eq!(store.current_bytes(), 0);
    }

    #[test]
    fn test_store_get_all_snapshot() {
        let mut store = EvictionStore::new(0, None);
        set(&mut store, "a", "1");
        set(&mut store, "b", "2");

        let snapshot = store.get_all();
        set(&mut store, "c", "3");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("a"), Some(&b"1".to_vec()));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_store_stats_counts_hits_and_misses() {
        let mut store = EvictionStore::new(100, None);
        set(&mut store, "key1", "value1");
        store.get("key1");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.current_bytes, 10);
        assert_eq!(stats.max_bytes, 100);
    }
}
