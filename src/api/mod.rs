//! API Module
//!
//! HTTP handlers and routing for a cache node.
//!
//! # Endpoints
//! - `GET /healthy` - Health check used by the registry heartbeat
//! - `GET /updateNodePool` - Peer list pushed by the registry
//! - `GET /api` - Read a key through the default controller
//! - `GET /stats` - Per-controller statistics
//! - `GET /_meshcache/{controller}/{key}` - Peer cache protocol

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
