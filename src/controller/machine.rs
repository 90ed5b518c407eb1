//! The per-name get/load state machine.
//!
//! `get`: local cache → peer sweep in ring order (anti-loop guarded, each hop
//! bounded by the sweep budget) → origin loader → cache population.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cache::{CacheStats, OnEvicted, SyncCache};
use crate::controller::token::{mint_token, token_age, ActiveTokens, SweepBudget};
use crate::controller::OriginLoader;
use crate::error::{CacheError, Result};
use crate::peer::NodePool;
use crate::singleflight::RequestCoalescer;

pub struct Controller {
    name: String,
    loader: Arc<dyn OriginLoader>,
    cache: SyncCache,
    pool: Arc<NodePool>,
    peer_flights: RequestCoalescer<Vec<u8>>,
    origin_flights: RequestCoalescer<Vec<u8>>,
    active: ActiveTokens,
    budget: SweepBudget,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("cache", &self.cache)
            .field("pool", &self.pool)
            .field("budget", &self.budget)
            .finish()
    }
}

impl Controller {
    pub(crate) fn new(
        name: String,
        max_bytes: usize,
        loader: Arc<dyn OriginLoader>,
        on_evicted: Option<OnEvicted>,
        pool: Arc<NodePool>,
        budget: SweepBudget,
    ) -> Self {
        Self {
            name,
            loader,
            cache: SyncCache::new(max_bytes, on_evicted),
            pool,
            peer_flights: RequestCoalescer::new(),
            origin_flights: RequestCoalescer::new(),
            active: ActiveTokens::default(),
            budget,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Get ==
    /// Returns the value for `key`, loading it through peers or the origin on
    /// a local miss. `token` is the anti-loop token of a forwarded request;
    /// `None` (or 0) starts a new request.
    pub async fn get(&self, key: &str, token: Option<u64>) -> Result<Vec<u8>> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        if let Some(value) = self.cache.get(key) {
            debug!(controller = %self.name, key, "hit");
            return Ok(value);
        }
        debug!(controller = %self.name, key, "miss, loading");

        let result = self.load(key, token).await;
        if let Err(err) = &result {
            warn!(controller = %self.name, key, error = %err, "load failed");
        }
        result
    }

    async fn load(&self, key: &str, token: Option<u64>) -> Result<Vec<u8>> {
        let forwarded = token.filter(|t| *t != 0);
        let token = forwarded.unwrap_or_else(mint_token);
        let _guard = self.active.enter(key, token)?;
        let deadline = self.budget.deadline_for(token);
        if forwarded.is_some() && self.budget.is_expired(token) {
            // Either a very slow sweep or the minting node's clock is behind ours
            warn!(
                controller = %self.name,
                key,
                token,
                age = ?token_age(token),
                deadline = ?self.budget.deadline,
                "forwarded token already past its sweep deadline, check clock skew"
            );
        }

        // Snapshot: membership changes apply from the next load
        let peers = self.pool.sweep_order();
        for peer in &peers {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                warn!(controller = %self.name, key, token, "sweep deadline passed, skipping remaining peers");
                break;
            }
            let hop = left.min(self.budget.hop_timeout);

            debug!(controller = %self.name, key, %peer, token, "asking peer");
            match self.fetch_from_peer(peer, key, token, hop).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(controller = %self.name, key, %peer, error = %err, "peer failed, trying next");
                }
            }
        }

        self.load_from_origin(key).await
    }

    async fn fetch_from_peer(
        &self,
        peer: &str,
        key: &str,
        token: u64,
        hop: std::time::Duration,
    ) -> Result<Vec<u8>> {
        self.peer_flights
            .run(key, move || async move {
                let value = tokio::time::timeout(hop, self.pool.fetch(peer, &self.name, key, token))
                    .await
                    .map_err(|_| {
                        CacheError::PeerUnavailable(format!("{peer} timed out after {hop:?}"))
                    })??;
                self.cache.set(key, value.clone());
                Ok(value)
            })
            .await
    }

    async fn load_from_origin(&self, key: &str) -> Result<Vec<u8>> {
        self.origin_flights
            .run(key, move || async move {
                debug!(controller = %self.name, key, "searching origin");
                match self.loader.load(key).await {
                    Ok(value) => {
                        info!(controller = %self.name, key, "origin hit");
                        self.cache.set(key, value.clone());
                        Ok(value)
                    }
                    Err(err) => {
                        warn!(controller = %self.name, key, error = %err, "origin miss");
                        Err(CacheError::KeyNotFound(key.to_string()))
                    }
                }
            })
            .await
    }

    // == Direct cache access ==
    /// Populates the local cache without consulting peers or the origin.
    pub fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        self.cache.set(key, value);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.cache.remove(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Copy of every locally cached entry.
    pub fn snapshot(&self) -> HashMap<String, Vec<u8>> {
        self.cache.get_all()
    }

    // == Membership ==
    pub fn update_peers(&self, urls: Vec<String>) {
        self.pool.update_peers(urls);
    }

    pub fn set_self_url(&self, url: impl Into<String>) {
        self.pool.set_self_url(url);
    }

    pub fn pool(&self) -> &Arc<NodePool> {
        &self.pool
    }

    /// Whether `token` is currently being served for `key` on this node.
    pub fn is_serving(&self, key: &str, token: u64) -> bool {
        self.active.is_active(key, token)
    }
}
