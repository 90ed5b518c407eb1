//! Peer Module
//!
//! The peer cache protocol: `GET {peer}{CORE_PREFIX}{controller}/{key}?code={token}`
//! answered with the raw value and a 200, or an error status and message.

mod client;
mod local;
mod pool;
mod server;

pub use client::{peer_url, HttpPeerClient, PeerClient, PeerFuture};
pub use local::{Hop, LocalNetwork};
pub use pool::NodePool;
pub use server::{parse_peer_path, serve_peer};

/// Path prefix of the peer protocol.
pub const CORE_PREFIX: &str = "/_meshcache/";
