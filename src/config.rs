//! Configuration Module
//!
//! Loads node and registry configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::controller::SweepBudget;

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Cache node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Host name advertised to peers
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Base URL advertised to the registry and peers
    pub url: String,
    /// Service (cluster) name to register under
    pub service_name: String,
    /// Name of the demo controller
    pub controller_name: String,
    /// Byte budget of the demo controller, 0 = unbounded
    pub cache_max_bytes: usize,
    pub registry_url: String,
    pub peer_hop_timeout: Duration,
    pub sweep_deadline: Duration,
}

impl NodeConfig {
    /// Creates a NodeConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `NODE_HOST` - Advertised host (default: localhost)
    /// - `NODE_PORT` - HTTP port (default: 8881)
    /// - `NODE_URL` - Advertised base URL (default: `http://{NODE_HOST}:{NODE_PORT}`)
    /// - `SERVICE_NAME` - Service to register under (default: cache)
    /// - `CONTROLLER_NAME` - Demo controller name (default: scores)
    /// - `CACHE_MAX_BYTES` - Demo controller byte budget (default: 2048)
    /// - `REGISTRY_URL` - Registry base URL (default: http://localhost:9999)
    /// - `PEER_HOP_TIMEOUT_MS` - Per-peer fetch bound (default: 2000)
    /// - `SWEEP_DEADLINE_MS` - Whole-sweep bound (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = env_string("NODE_HOST", &defaults.host);
        let port = env_or("NODE_PORT", defaults.port);
        let url = env_string("NODE_URL", &format!("http://{host}:{port}"));

        Self {
            url,
            service_name: env_string("SERVICE_NAME", &defaults.service_name),
            controller_name: env_string("CONTROLLER_NAME", &defaults.controller_name),
            cache_max_bytes: env_or("CACHE_MAX_BYTES", defaults.cache_max_bytes),
            registry_url: env_string("REGISTRY_URL", &defaults.registry_url),
            peer_hop_timeout: Duration::from_millis(env_or(
                "PEER_HOP_TIMEOUT_MS",
                defaults.peer_hop_timeout.as_millis() as u64,
            )),
            sweep_deadline: Duration::from_millis(env_or(
                "SWEEP_DEADLINE_MS",
                defaults.sweep_deadline.as_millis() as u64,
            )),
            host,
            port,
        }
    }

    pub fn sweep_budget(&self) -> SweepBudget {
        SweepBudget::new(self.peer_hop_timeout, self.sweep_deadline)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        let budget = SweepBudget::default();
        Self {
            host: "localhost".to_string(),
            port: 8881,
            url: "http://localhost:8881".to_string(),
            service_name: "cache".to_string(),
            controller_name: "scores".to_string(),
            cache_max_bytes: 2 << 10,
            registry_url: "http://localhost:9999".to_string(),
            peer_hop_timeout: budget.hop_timeout,
            sweep_deadline: budget.deadline,
        }
    }
}

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub host: String,
    pub port: u16,
    /// Pause between heartbeat cycles
    pub heartbeat_interval: Duration,
    /// Bound on a single health probe or push delivery
    pub probe_timeout: Duration,
    /// Virtual nodes per instance
    pub ring_replicas: usize,
}

impl RegistryConfig {
    /// Creates a RegistryConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `REGISTRY_HOST` - Bind host (default: localhost)
    /// - `REGISTRY_PORT` - HTTP port (default: 9999)
    /// - `HEARTBEAT_INTERVAL_SECS` - Heartbeat period (default: 5)
    /// - `PROBE_TIMEOUT_MS` - Probe timeout (default: 1000)
    /// - `RING_REPLICAS` - Virtual nodes per instance (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_string("REGISTRY_HOST", &defaults.host),
            port: env_or("REGISTRY_PORT", defaults.port),
            heartbeat_interval: Duration::from_secs(env_or(
                "HEARTBEAT_INTERVAL_SECS",
                defaults.heartbeat_interval.as_secs(),
            )),
            probe_timeout: Duration::from_millis(env_or(
                "PROBE_TIMEOUT_MS",
                defaults.probe_timeout.as_millis() as u64,
            )),
            ring_replicas: env_or("RING_REPLICAS", defaults.ring_replicas),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9999,
            heartbeat_interval: Duration::from_secs(5),
            probe_timeout: Duration::from_millis(1000),
            ring_replicas: crate::registry::REGISTRY_REPLICAS,
        }
    }
}
