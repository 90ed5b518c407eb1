//! Counters and gauges of one eviction store.

use serde::Serialize;

/// Point-in-time statistics of an [`EvictionStore`](crate::cache::EvictionStore).
///
/// Counters only grow; the gauges are refreshed each time a snapshot is taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped under byte pressure (explicit removals excluded)
    pub evictions: u64,
    pub total_entries: usize,
    /// Sum of `len(key) + len(value)` over live entries
    pub current_bytes: usize,
    /// 0 = unbounded
    pub max_bytes: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// hits / lookups, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_usage(&mut self, total_entries: usize, current_bytes: usize, max_bytes: usize) {
        self.total_entries = total_entries;
        self.current_bytes = current_bytes;
        self.max_bytes = max_bytes;
    }

    /// Share of the byte budget in use, 0.0 when unbounded.
    pub fn fill_ratio(&self) -> f64 {
        if self.max_bytes == 0 {
            return 0.0;
        }
        self.current_bytes as f64 / self.max_bytes as f64
    }
}
