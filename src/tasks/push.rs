//! Membership Push Worker
//!
//! Delivers ring-ordered peer lists to every live instance of a service.
//! Jobs are queued on an mpsc channel and drained by a single task, so a
//! delivery failure is counted and logged instead of vanishing with a
//! detached task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::NodePoolUpdate;

/// One membership change to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushJob {
    pub service: String,
    /// Full membership in ring order; also the delivery targets
    pub urls: Vec<String>,
}

/// Delivery counters shared between the worker and its observers.
#[derive(Debug, Default)]
pub struct PushStats {
    jobs: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl PushStats {
    pub fn jobs(&self) -> u64 {
        self.jobs.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Sending half of the push worker.
#[derive(Debug, Clone)]
pub struct PushQueue {
    tx: mpsc::UnboundedSender<PushJob>,
    stats: Arc<PushStats>,
}

impl PushQueue {
    /// Queues a job. Returns false once the worker has stopped.
    pub fn enqueue(&self, job: PushJob) -> bool {
        match self.tx.send(job) {
            Ok(()) => true,
            Err(err) => {
                warn!(service = %err.0.service, "push worker stopped, dropping membership update");
                false
            }
        }
    }

    pub fn stats(&self) -> Arc<PushStats> {
        self.stats.clone()
    }

    /// Queue with no worker behind it; jobs pile up in the returned receiver.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<PushJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            tx,
            stats: Arc::default(),
        };
        (queue, rx)
    }
}

/// Spawns the push worker.
///
/// `request_timeout` bounds each individual delivery. The returned handle
/// can be aborted during graceful shutdown.
pub fn spawn_push_worker(request_timeout: Duration) -> (PushQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<PushJob>();
    let stats = Arc::new(PushStats::default());
    let client = reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .unwrap_or_default();

    let worker_stats = stats.clone();
    let handle = tokio::spawn(async move {
        info!("Starting membership push worker");

        while let Some(job) = rx.recv().await {
            worker_stats.jobs.fetch_add(1, Ordering::Relaxed);
            let body = NodePoolUpdate {
                urls: job.urls.clone(),
            };

            let outcomes = join_all(job.urls.iter().map(|url| deliver(&client, url, &body))).await;
            for (url, outcome) in job.urls.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => {
                        worker_stats.delivered.fetch_add(1, Ordering::Relaxed);
                        debug!(service = %job.service, %url, "membership pushed");
                    }
                    Err(reason) => {
                        worker_stats.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(service = %job.service, %url, %reason, "membership push failed");
                    }
                }
            }
        }

        info!("Push worker queue closed");
    });

    (PushQueue { tx, stats }, handle)
}

async fn deliver(
    client: &reqwest::Client,
    url: &str,
    body: &NodePoolUpdate,
) -> std::result::Result<(), String> {
    let endpoint = format!("{}/updateNodePool", url.trim_end_matches('/'));
    let response = client
        .get(&endpoint)
        .json(body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("status {}", response.status()))
    }
}
