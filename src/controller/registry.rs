//! Named controllers of one node.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::cache::OnEvicted;
use crate::controller::{Controller, OriginLoader, SweepBudget};
use crate::error::{CacheError, Result};
use crate::peer::NodePool;

/// Explicit name → controller registry, constructed at startup and passed to
/// whoever needs to resolve a controller (for instance the peer server).
///
/// All controllers created here share the node's [`NodePool`].
#[derive(Debug)]
pub struct Controllers {
    pool: Arc<NodePool>,
    budget: SweepBudget,
    by_name: RwLock<HashMap<String, Arc<Controller>>>,
}

impl Controllers {
    pub fn new(pool: Arc<NodePool>) -> Self {
        Self::with_budget(pool, SweepBudget::default())
    }

    pub fn with_budget(pool: Arc<NodePool>, budget: SweepBudget) -> Self {
        Self {
            pool,
            budget,
            by_name: RwLock::new(HashMap::new()),
        }
    }

    /// Creates and registers a controller. Names are unique per registry.
    pub fn create(
        &self,
        name: impl Into<String>,
        max_bytes: usize,
        loader: impl OriginLoader + 'static,
        on_evicted: Option<OnEvicted>,
    ) -> Result<Arc<Controller>> {
        let name = name.into();
        let mut by_name = self.by_name.write();
        if by_name.contains_key(&name) {
            return Err(CacheError::DuplicateControllerName(name));
        }

        let controller = Arc::new(Controller::new(
            name.clone(),
            max_bytes,
            Arc::new(loader),
            on_evicted,
            self.pool.clone(),
            self.budget,
        ));
        by_name.insert(name.clone(), controller.clone());
        info!(controller = %name, max_bytes, "controller created");
        Ok(controller)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Controller>> {
        self.by_name.read().get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn all(&self) -> Vec<Arc<Controller>> {
        let mut all: Vec<Arc<Controller>> = self.by_name.read().values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    pub fn pool(&self) -> &Arc<NodePool> {
        &self.pool
    }
}
