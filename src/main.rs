//! meshcache node
//!
//! Serves one demo controller, joins the cluster through the registry and
//! leaves it again on shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meshcache::{
    create_router, shutdown_signal, AppState, Controllers, MapLoader, NodeConfig, NodePool,
    RegistryClient,
};

/// Small in-memory origin standing in for a slow backing database.
fn demo_origin() -> MapLoader {
    MapLoader::new([
        ("demo", "demoValue"),
        ("zkCache", "zkCacheValue"),
        ("game", "gameValue"),
        ("test11111111111", "test11111111111Value"),
    ])
}

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the node pool and the demo controller
/// 4. Start HTTP server on the configured port
/// 5. Register with the registry
/// 6. On SIGINT/SIGTERM, shut down gracefully and deregister
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting meshcache node");

    let config = NodeConfig::from_env();
    info!(
        "Configuration loaded: url={}, service={}, controller={}, max_bytes={}, registry={}",
        config.url,
        config.service_name,
        config.controller_name,
        config.cache_max_bytes,
        config.registry_url
    );

    // Alone until the registry pushes the first peer list
    let pool = Arc::new(NodePool::http(config.url.clone()));
    pool.update_peers(vec![config.url.clone()]);
    let controllers = Arc::new(Controllers::with_budget(pool, config.sweep_budget()));
    controllers.create(
        config.controller_name.clone(),
        config.cache_max_bytes,
        demo_origin(),
        Some(Box::new(|key: &str, value: &[u8]| {
            debug!(key, bytes = value.len(), "evicted");
        })),
    )?;

    let app = create_router(AppState::new(
        controllers.clone(),
        config.controller_name.clone(),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    let registry = RegistryClient::new(config.registry_url.clone());
    {
        let registry = registry.clone();
        let service = config.service_name.clone();
        let url = config.url.clone();
        tokio::spawn(async move {
            if let Err(err) = registry.register(&service, &url).await {
                warn!(error = %err, "registration failed, running standalone");
            }
        });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving node API")?;

    if let Err(err) = registry
        .deregister(&config.service_name, &config.url)
        .await
    {
        warn!(error = %err, "deregistration failed");
    }

    info!("Server shutdown complete");
    Ok(())
}
