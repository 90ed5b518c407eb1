//! Error types for the distributed cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::Envelope;

// == Cache Error Enum ==
/// Unified error type for controllers, peers and the registry.
///
/// `Clone` is required so that a single in-flight result can be handed to
/// every coalesced waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty key passed to `Get`
    #[error("key must not be empty")]
    EmptyKey,

    /// Anti-loop token already active for this key on this node
    #[error("circular request detected for key: {0}")]
    CircularRequest(String),

    /// Peer unreachable, timed out or answered with a non-200 status
    #[error("peer unavailable: {0}")]
    PeerUnavailable(String),

    /// All peers exhausted and the origin loader failed
    #[error("can not find the value by key: {0}")]
    KeyNotFound(String),

    /// A controller with this name already exists
    #[error("controller name already exists: {0}")]
    DuplicateControllerName(String),

    /// No controller registered under this name
    #[error("no such controller: {0}")]
    UnknownController(String),

    /// Peer protocol path could not be parsed
    #[error("bad request path: {0}")]
    MalformedPath(String),

    /// Malformed request body or query string
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed registration payload
    #[error("invalid registration: {0}")]
    RegistryValidation(String),

    /// Service or instance absent from the registry
    #[error("registry entry not found: {0}")]
    RegistryNotFound(String),

    /// Registry could not be reached
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// HTTP status used both for envelope responses and the peer protocol.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::EmptyKey
            | CacheError::InvalidRequest(_)
            | CacheError::MalformedPath(_)
            | CacheError::RegistryValidation(_) => StatusCode::BAD_REQUEST,
            CacheError::KeyNotFound(_)
            | CacheError::UnknownController(_)
            | CacheError::RegistryNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::DuplicateControllerName(_) => StatusCode::CONFLICT,
            CacheError::CircularRequest(_) => StatusCode::LOOP_DETECTED,
            CacheError::PeerUnavailable(_) => StatusCode::BAD_GATEWAY,
            CacheError::RegistryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(Envelope::<()>::fail(status.as_u16(), self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
