//! Heartbeat Task
//!
//! Background task that periodically probes every registered instance and
//! evicts the ones that stop answering.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::Registry;

/// Consecutive failed probes after which an instance is evicted.
pub const PROBE_ATTEMPTS: usize = 3;

/// Spawns a background task that runs a heartbeat cycle every `interval`.
///
/// Each probe is bounded by `probe_timeout`. Returns a JoinHandle that can be
/// aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let registry = Arc::new(Registry::default());
/// let heartbeat = spawn_heartbeat_task(registry.clone(), Duration::from_secs(5), Duration::from_secs(1));
/// // Later, during shutdown:
/// heartbeat.abort();
/// ```
pub fn spawn_heartbeat_task(
    registry: Arc<Registry>,
    interval: Duration,
    probe_timeout: Duration,
) -> JoinHandle<()> {
    let client = probe_client(probe_timeout);

    tokio::spawn(async move {
        info!("Starting heartbeat task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = run_heartbeat_cycle(&registry, &client).await;
            if removed > 0 {
                info!("Heartbeat: evicted {} unresponsive instances", removed);
            } else {
                debug!("Heartbeat: all instances healthy");
            }
        }
    })
}

/// HTTP client used for health probes.
pub fn probe_client(probe_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(probe_timeout)
        .build()
        .unwrap_or_default()
}

/// One heartbeat sweep: probes every instance, then applies all evictions at
/// once. Returns the number of evicted instances.
pub async fn run_heartbeat_cycle(registry: &Registry, client: &reqwest::Client) -> usize {
    let members = registry.snapshot().await;
    let verdicts = join_all(members.iter().map(|(_, url)| probe(client, url))).await;

    let dead: Vec<(String, String)> = members
        .into_iter()
        .zip(verdicts)
        .filter_map(|(member, alive)| (!alive).then_some(member))
        .collect();
    if dead.is_empty() {
        return 0;
    }
    registry.evict(&dead).await
}

/// True if any of [`PROBE_ATTEMPTS`] probes of `GET {url}/healthy` answers 200.
async fn probe(client: &reqwest::Client, url: &str) -> bool {
    let endpoint = format!("{}/healthy", url.trim_end_matches('/'));
    for attempt in 1..=PROBE_ATTEMPTS {
        match client.get(&endpoint).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => return true,
            Ok(response) => {
                warn!(%url, attempt, status = %response.status(), "health probe failed");
            }
            Err(err) => {
                warn!(%url, attempt, error = %err, "health probe failed");
            }
        }
    }
    false
}
