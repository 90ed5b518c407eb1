//! In-process transport: routes peer fetches straight to the [`Controllers`]
//! registered under a URL, without a network hop.
//!
//! Useful for running several logical nodes inside one process.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::controller::Controllers;
use crate::error::{CacheError, Result};
use crate::peer::{PeerClient, PeerFuture};

/// One recorded hop: target URL and whether it produced a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub peer: String,
    pub key: String,
    pub outcome: std::result::Result<(), CacheError>,
}

#[derive(Default)]
pub struct LocalNetwork {
    nodes: RwLock<HashMap<String, Arc<Controllers>>>,
    down: RwLock<HashSet<String>>,
    hops: Mutex<Vec<Hop>>,
}

impl LocalNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes `controllers` reachable at `url`.
    pub fn attach(&self, url: impl Into<String>, controllers: Arc<Controllers>) {
        self.nodes.write().insert(url.into(), controllers);
    }

    /// Marks `url` unreachable (or reachable again).
    pub fn set_down(&self, url: &str, down: bool) {
        let mut set = self.down.write();
        if down {
            set.insert(url.to_string());
        } else {
            set.remove(url);
        }
    }

    /// Every hop taken so far, in order of completion.
    pub fn hops(&self) -> Vec<Hop> {
        self.hops.lock().clone()
    }

    async fn route(&self, peer: &str, controller: &str, key: &str, token: u64) -> Result<Vec<u8>> {
        if self.down.read().contains(peer) {
            return Err(CacheError::PeerUnavailable(format!("{peer} is down")));
        }
        let node = self
            .nodes
            .read()
            .get(peer)
            .cloned()
            .ok_or_else(|| CacheError::PeerUnavailable(format!("{peer} is not attached")))?;
        let target = node
            .get(controller)
            .ok_or_else(|| CacheError::PeerUnavailable(format!("{peer} has no {controller}")))?;

        target.get(key, Some(token)).await
    }
}

impl PeerClient for LocalNetwork {
    fn fetch<'a>(
        &'a self,
        peer: &'a str,
        controller: &'a str,
        key: &'a str,
        token: u64,
    ) -> PeerFuture<'a> {
        Box::pin(async move {
            let result = self.route(peer, controller, key, token).await;
            self.hops.lock().push(Hop {
                peer: peer.to_string(),
                key: key.to_string(),
                outcome: result.as_ref().map(|_| ()).map_err(Clone::clone),
            });
            result
        })
    }
}
