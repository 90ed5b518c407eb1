//! API Handlers
//!
//! HTTP request handlers for each cache node endpoint.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::controller::{Controller, Controllers};
use crate::error::{CacheError, Result};
use crate::models::{
    ApiQuery, ControllerStats, Envelope, HealthResponse, NodePoolUpdate, PeerQuery,
};
use crate::peer::serve_peer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Every controller of this node
    pub controllers: Arc<Controllers>,
    /// Controller answering `GET /api`
    pub default_controller: String,
}

impl AppState {
    pub fn new(controllers: Arc<Controllers>, default_controller: impl Into<String>) -> Self {
        Self {
            controllers,
            default_controller: default_controller.into(),
        }
    }

    fn default_controller(&self) -> Result<Arc<Controller>> {
        self.controllers
            .get(&self.default_controller)
            .ok_or_else(|| CacheError::UnknownController(self.default_controller.clone()))
    }
}

/// Handler for GET /healthy
pub async fn healthy_handler() -> Json<Envelope<HealthResponse>> {
    Json(Envelope::success(HealthResponse::healthy()))
}

/// Handler for GET /updateNodePool
///
/// Replaces the node's peer list with the pushed one.
pub async fn update_node_pool_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NodePoolUpdate>, JsonRejection>,
) -> Result<Json<Envelope<()>>> {
    let Json(update) = payload.map_err(|e| CacheError::InvalidRequest(e.body_text()))?;

    info!(peers = ?update.urls, "node pool updated");
    state.controllers.pool().update_peers(update.urls);

    Ok(Json(Envelope::ok()))
}

/// Handler for GET /api
///
/// Reads `key` through the default controller; the value is returned as a
/// (lossy) UTF-8 string.
pub async fn api_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ApiQuery>, QueryRejection>,
) -> Result<Json<Envelope<String>>> {
    let Query(query) = query.map_err(|e| CacheError::InvalidRequest(e.body_text()))?;
    let controller = state.default_controller()?;

    let value = controller.get(&query.key, query.code).await?;
    Ok(Json(Envelope::success(
        String::from_utf8_lossy(&value).into_owned(),
    )))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<Envelope<Vec<ControllerStats>>> {
    let stats = state
        .controllers
        .all()
        .iter()
        .map(|c| ControllerStats::new(c.name(), c.stats()))
        .collect();
    Json(Envelope::success(stats))
}

/// Handler for the peer cache protocol, `GET /_meshcache/{controller}/{key}`.
///
/// Answers raw bytes, not an envelope.
pub async fn peer_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: std::result::Result<Query<PeerQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return (StatusCode::BAD_REQUEST, "code must be an unsigned integer").into_response();
    };
    serve_peer(&state.controllers, uri.path(), query.code).await
}
