//! Inbound half of the peer cache protocol.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::controller::Controllers;
use crate::error::{CacheError, Result};
use crate::peer::CORE_PREFIX;

/// Splits `{CORE_PREFIX}{controller}/{key}` into its decoded segments.
pub fn parse_peer_path(path: &str) -> Result<(String, String)> {
    let rest = path
        .strip_prefix(CORE_PREFIX)
        .ok_or_else(|| CacheError::MalformedPath(path.to_string()))?;

    let mut parts = rest.split('/');
    let (Some(controller), Some(key), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CacheError::MalformedPath(path.to_string()));
    };
    if controller.is_empty() {
        return Err(CacheError::MalformedPath(path.to_string()));
    }

    let decode = |segment: &str| {
        urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .map_err(|_| CacheError::MalformedPath(path.to_string()))
    };
    Ok((decode(controller)?, decode(key)?))
}

/// Answers one peer request: raw bytes with 200, or the error text with
/// the error's status.
pub async fn serve_peer(controllers: &Controllers, path: &str, token: Option<u64>) -> Response {
    debug!(%path, ?token, "peer request");
    match lookup(controllers, path, token).await {
        Ok(value) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            value,
        )
            .into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

async fn lookup(controllers: &Controllers, path: &str, token: Option<u64>) -> Result<Vec<u8>> {
    let (name, key) = parse_peer_path(path)?;
    let controller = controllers
        .get(&name)
        .ok_or(CacheError::UnknownController(name))?;
    controller.get(&key, token).await
}
