//! Synchronized Cache Module
//!
//! Serializes access to one [`EvictionStore`] behind a single mutex.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::cache::{CacheStats, EvictionStore, OnEvicted};

/// Thread-safe wrapper over exactly one store.
///
/// The lock is held only for the duration of a single store operation and
/// never across an `.await`.
#[derive(Debug)]
pub struct SyncCache {
    store: Mutex<EvictionStore>,
}

impl SyncCache {
    pub fn new(max_bytes: usize, on_evicted: Option<OnEvicted>) -> Self {
        Self {
            store: Mutex::new(EvictionStore::new(max_bytes, on_evicted)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.store.lock().get(key)
    }

    pub fn set(&self, key: impl Into<String>, value: Vec<u8>) {
        self.store.lock().set(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.store.lock().remove(key)
    }

    pub fn get_all(&self) -> HashMap<String, Vec<u8>> {
        self.store.lock().get_all()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }
}
