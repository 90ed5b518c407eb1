//! NodePool: self URL plus the ordered peer list pushed by the registry.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::peer::{HttpPeerClient, PeerClient};

/// Peer transport shared by every controller of a node.
///
/// The peer list contains every member of the cluster, self included, in
/// ring order. It is replaced wholesale on each membership push.
pub struct NodePool {
    self_url: RwLock<String>,
    peers: RwLock<Vec<String>>,
    client: Arc<dyn PeerClient>,
}

impl fmt::Debug for NodePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePool")
            .field("self_url", &*self.self_url.read())
            .field("peers", &*self.peers.read())
            .finish()
    }
}

impl NodePool {
    pub fn new(self_url: impl Into<String>, client: Arc<dyn PeerClient>) -> Self {
        Self {
            self_url: RwLock::new(self_url.into()),
            peers: RwLock::new(Vec::new()),
            client,
        }
    }

    /// Pool talking HTTP to its peers.
    pub fn http(self_url: impl Into<String>) -> Self {
        Self::new(self_url, Arc::new(HttpPeerClient::default()))
    }

    pub fn self_url(&self) -> String {
        self.self_url.read().clone()
    }

    pub fn set_self_url(&self, url: impl Into<String>) {
        *self.self_url.write() = url.into();
    }

    pub fn peers(&self) -> Vec<String> {
        self.peers.read().clone()
    }

    /// Atomically replaces the peer list.
    pub fn update_peers(&self, urls: Vec<String>) {
        *self.peers.write() = urls;
    }

    /// Traversal order for a peer sweep: the peers after self, wrapping
    /// around, with self excluded. When self is not a member the whole list
    /// is walked from the start.
    pub fn sweep_order(&self) -> Vec<String> {
        let me = self.self_url.read().clone();
        let peers = self.peers.read();
        let start = peers
            .iter()
            .position(|url| *url == me)
            .map(|i| i + 1)
            .unwrap_or(0);

        peers
            .iter()
            .cycle()
            .skip(start)
            .take(peers.len())
            .filter(|url| **url != me)
            .cloned()
            .collect()
    }

    pub async fn fetch(&self, peer: &str, controller: &str, key: &str, token: u64) -> Result<Vec<u8>> {
        self.client.fetch(peer, controller, key, token).await
    }
}
