//! Registry Module
//!
//! Service membership, consistent-hash instance resolution and the HTTP API
//! nodes use to join and leave a cluster.

mod client;
mod routes;
mod state;

pub use client::RegistryClient;
pub use routes::{create_registry_router, RegistryState};
pub use state::{Registry, REGISTRY_REPLICAS};
