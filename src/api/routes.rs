//! API Routes
//!
//! Configures the Axum router with all cache node endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    api_handler, healthy_handler, peer_handler, stats_handler, update_node_pool_handler, AppState,
};
use crate::peer::CORE_PREFIX;

/// Creates the node router.
///
/// # Endpoints
/// - `GET /healthy` - Health probe used by the registry heartbeat
/// - `GET /updateNodePool` - Membership push from the registry
/// - `GET /api?key=..&code=..` - Read through the default controller
/// - `GET /stats` - Per-controller cache statistics
/// - `GET /_meshcache/{controller}/{key}?code=..` - Peer cache protocol
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthy", get(healthy_handler))
        .route("/updateNodePool", get(update_node_pool_handler))
        .route("/api", get(api_handler))
        .route("/stats", get(stats_handler))
        .route(&format!("{CORE_PREFIX}*rest"), get(peer_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
