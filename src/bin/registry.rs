//! meshcache registry
//!
//! Tracks cluster membership, probes instance health and pushes peer lists.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meshcache::{
    create_registry_router, shutdown_signal, spawn_heartbeat_task, spawn_push_worker, Registry,
    RegistryConfig,
};

/// Main entry point for the registry.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Start the push worker and the heartbeat task
/// 4. Start HTTP server on the configured port
/// 5. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting meshcache registry");

    let config = RegistryConfig::from_env();
    info!(
        "Configuration loaded: port={}, heartbeat_interval={:?}, probe_timeout={:?}, replicas={}",
        config.port, config.heartbeat_interval, config.probe_timeout, config.ring_replicas
    );

    let (push, push_handle) = spawn_push_worker(config.probe_timeout);
    let registry = Arc::new(Registry::with_push(config.ring_replicas, push));
    info!("Push worker started");

    let heartbeat_handle = spawn_heartbeat_task(
        registry.clone(),
        config.heartbeat_interval,
        config.probe_timeout,
    );
    info!("Heartbeat task started");

    let app = create_registry_router(registry);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Registry listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_then_abort(vec![heartbeat_handle, push_handle]))
        .await
        .context("serving registry API")?;

    info!("Registry shutdown complete");
    Ok(())
}

/// Waits for shutdown signal, then aborts the background tasks.
async fn shutdown_then_abort(tasks: Vec<JoinHandle<()>>) {
    shutdown_signal().await;

    for task in tasks {
        task.abort();
    }
    info!("Background tasks aborted");
}
