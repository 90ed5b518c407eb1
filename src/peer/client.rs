//! Peer clients: the outbound half of the peer cache protocol.

use std::time::Duration;

use axum::http::StatusCode;
use futures::future::BoxFuture;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::peer::CORE_PREFIX;

/// Future returned by [`PeerClient::fetch`].
pub type PeerFuture<'a> = BoxFuture<'a, Result<Vec<u8>>>;

/// Fetches a key from the named controller of a remote node.
pub trait PeerClient: Send + Sync {
    fn fetch<'a>(
        &'a self,
        peer: &'a str,
        controller: &'a str,
        key: &'a str,
        token: u64,
    ) -> PeerFuture<'a>;
}

/// Builds `{peer}{CORE_PREFIX}{controller}/{key}?code={token}` with both
/// path segments percent-encoded.
pub fn peer_url(peer: &str, controller: &str, key: &str, token: u64) -> String {
    format!(
        "{}{}{}/{}?code={}",
        peer.trim_end_matches('/'),
        CORE_PREFIX,
        urlencoding::encode(controller),
        urlencoding::encode(key),
        token
    )
}

/// Peer client speaking the HTTP protocol through `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Client with a connect timeout; overall hop timeouts are applied by the
    /// controller.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_default();
        Self::new(client)
    }

    async fn get(&self, peer: &str, controller: &str, key: &str, token: u64) -> Result<Vec<u8>> {
        let url = peer_url(peer, controller, key, token);
        debug!(%url, "fetching from peer");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CacheError::PeerUnavailable(format!("{peer}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            let body = response
                .bytes()
                .await
                .map_err(|e| CacheError::PeerUnavailable(format!("reading body from {peer}: {e}")))?;
            return Ok(body.to_vec());
        }

        let text = response.text().await.unwrap_or_default();
        if status.as_u16() == StatusCode::LOOP_DETECTED.as_u16() {
            return Err(CacheError::CircularRequest(key.to_string()));
        }
        Err(CacheError::PeerUnavailable(format!(
            "{peer} returned {status}: {}",
            text.trim()
        )))
    }
}

impl Default for HttpPeerClient {
    fn default() -> Self {
        Self::with_connect_timeout(Duration::from_secs(1))
    }
}

impl PeerClient for HttpPeerClient {
    fn fetch<'a>(
        &'a self,
        peer: &'a str,
        controller: &'a str,
        key: &'a str,
        token: u64,
    ) -> PeerFuture<'a> {
        Box::pin(self.get(peer, controller, key, token))
    }
}
