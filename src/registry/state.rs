//! Registry state: per-service membership and hash ring.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::models::RegistrationRequest;
use crate::ring::HashRing;
use crate::tasks::{PushJob, PushQueue};

/// Virtual nodes per instance on the registry side.
pub const REGISTRY_REPLICAS: usize = 5;

#[derive(Debug, Clone)]
struct ServiceEntry {
    /// Registration order, no duplicates
    urls: Vec<String>,
    ring: HashRing,
}

impl ServiceEntry {
    fn new(replicas: usize) -> Self {
        Self {
            urls: Vec::new(),
            ring: HashRing::new(replicas),
        }
    }

    fn remove(&mut self, url: &str) -> bool {
        let before = self.urls.len();
        self.urls.retain(|u| u != url);
        self.ring.remove_by_url(url);
        self.urls.len() != before
    }
}

/// Service membership shared by the registry router and the heartbeat task.
///
/// Reads take the read lock, `add`/`remove` the write lock. Every membership
/// change queues a push of the full ring-ordered list to the service's
/// current instances.
#[derive(Debug)]
pub struct Registry {
    services: RwLock<HashMap<String, ServiceEntry>>,
    replicas: usize,
    push: Option<PushQueue>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(REGISTRY_REPLICAS)
    }
}

impl Registry {
    /// Registry without a push worker; membership changes stay local.
    pub fn new(replicas: usize) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            replicas,
            push: None,
        }
    }

    pub fn with_push(replicas: usize, push: PushQueue) -> Self {
        Self {
            push: Some(push),
            ..Self::new(replicas)
        }
    }

    // == Add ==
    /// Registers `url` under `service`. Registering twice is a no-op for
    /// membership but still re-broadcasts the list.
    pub async fn add(&self, service: &str, url: &str) -> Result<()> {
        if let Some(reason) = RegistrationRequest::new(service, url).validate() {
            return Err(CacheError::RegistryValidation(reason));
        }

        let mut services = self.services.write().await;
        let entry = services
            .entry(service.to_string())
            .or_insert_with(|| ServiceEntry::new(self.replicas));
        if !entry.urls.iter().any(|u| u == url) {
            entry.urls.push(url.to_string());
            entry.ring.set([url]);
            info!(service, url, "instance registered");
        } else {
            debug!(service, url, "instance already registered");
        }
        // Queued under the lock so queue order matches snapshot order
        self.broadcast(service, entry.ring.owners_in_ring_order());
        Ok(())
    }

    // == Remove ==
    /// Deregisters `url`. Fails with `RegistryNotFound` if the pair is absent.
    pub async fn remove(&self, service: &str, url: &str) -> Result<()> {
        let mut services = self.services.write().await;
        let Some(entry) = services.get_mut(service) else {
            return Err(CacheError::RegistryNotFound(format!("service {service}")));
        };
        if !entry.remove(url) {
            return Err(CacheError::RegistryNotFound(format!(
                "instance {url} of service {service}"
            )));
        }
        info!(service, url, "instance deregistered");

        let urls = entry.ring.owners_in_ring_order();
        if urls.is_empty() {
            services.remove(service);
        }
        self.broadcast(service, urls);
        Ok(())
    }

    /// Removes every listed instance in one write, then pushes one update per
    /// affected service. Absent pairs are ignored. Returns how many were removed.
    pub async fn evict(&self, dead: &[(String, String)]) -> usize {
        let mut removed = 0;
        let mut touched: HashMap<String, Vec<String>> = HashMap::new();
        let mut services = self.services.write().await;
        for (service, url) in dead {
            let Some(entry) = services.get_mut(service) else {
                continue;
            };
            if entry.remove(url) {
                removed += 1;
                info!(service = %service, url = %url, "instance evicted");
                touched.insert(service.clone(), entry.ring.owners_in_ring_order());
            }
        }
        services.retain(|_, entry| !entry.urls.is_empty());

        for (service, urls) in touched {
            self.broadcast(&service, urls);
        }
        removed
    }

    // == Resolve ==
    /// Instance owning `key` on the service's ring.
    pub async fn resolve(&self, service: &str, key: &str) -> Result<String> {
        let services = self.services.read().await;
        services
            .get(service)
            .and_then(|entry| entry.ring.get(key))
            .map(str::to_string)
            .ok_or_else(|| CacheError::RegistryNotFound(format!("no instance of service {service}")))
    }

    /// Instances of `service` in ring order; empty for unknown services.
    pub async fn instances(&self, service: &str) -> Vec<String> {
        let services = self.services.read().await;
        services
            .get(service)
            .map(|entry| entry.ring.owners_in_ring_order())
            .unwrap_or_default()
    }

    /// `(service, url)` pairs of every registered instance.
    pub async fn snapshot(&self) -> Vec<(String, String)> {
        let services = self.services.read().await;
        let mut pairs: Vec<(String, String)> = services
            .iter()
            .flat_map(|(service, entry)| {
                entry
                    .urls
                    .iter()
                    .map(move |url| (service.clone(), url.clone()))
            })
            .collect();
        pairs.sort();
        pairs
    }

    /// Service name to ring-ordered instances.
    pub async fn services(&self) -> HashMap<String, Vec<String>> {
        let services = self.services.read().await;
        services
            .iter()
            .map(|(name, entry)| (name.clone(), entry.ring.owners_in_ring_order()))
            .collect()
    }

    /// Must be called with the write lock held.
    fn broadcast(&self, service: &str, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        if let Some(push) = &self.push {
            push.enqueue(PushJob {
                service: service.to_string(),
                urls,
            });
        }
    }
}
