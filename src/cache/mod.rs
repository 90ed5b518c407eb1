//! Cache Module
//!
//! Provides the bounded, byte-accounted LRU store and its synchronized wrapper.

mod lru;
mod stats;
mod store;
mod sync;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use lru::{LruList, Slot};
pub use stats::CacheStats;
pub use store::{EvictionStore, OnEvicted};
pub use sync::SyncCache;
