//! meshcache - an embeddable distributed cache
//!
//! Nodes keep byte-bounded LRU caches per named controller. A miss is
//! answered by sweeping the other nodes in ring order under an anti-loop
//! token, then by the controller's origin loader. A small registry tracks
//! membership, probes instance health and pushes peer lists to every node.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod peer;
pub mod registry;
pub mod ring;
pub mod shutdown;
pub mod singleflight;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::{NodeConfig, RegistryConfig};
pub use controller::{Controller, Controllers, MapLoader, OriginLoader, SweepBudget};
pub use error::{CacheError, Result};
pub use peer::NodePool;
pub use registry::{create_registry_router, Registry, RegistryClient};
pub use ring::HashRing;
pub use shutdown::shutdown_signal;
pub use tasks::{spawn_heartbeat_task, spawn_push_worker};
