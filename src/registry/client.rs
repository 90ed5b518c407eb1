//! HTTP client for the registry API, used by nodes to join and leave.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::models::{Envelope, RegistrationRequest, ResolvedInstance};

#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: String,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /services`
    pub async fn register(&self, service: &str, url: &str) -> Result<()> {
        let request = self
            .http
            .post(format!("{}/services", self.base_url))
            .json(&RegistrationRequest::new(service, url));
        self.send::<()>(request).await?;
        info!(registry = %self.base_url, service, url, "registered");
        Ok(())
    }

    /// `DELETE /services`
    pub async fn deregister(&self, service: &str, url: &str) -> Result<()> {
        let request = self
            .http
            .delete(format!("{}/services", self.base_url))
            .json(&RegistrationRequest::new(service, url));
        self.send::<()>(request).await?;
        info!(registry = %self.base_url, service, url, "deregistered");
        Ok(())
    }

    /// `GET /services`: instance owning `key`.
    pub async fn resolve(&self, service: &str, key: &str) -> Result<String> {
        let request = self
            .http
            .get(format!("{}/services", self.base_url))
            .query(&[("serviceName", service), ("key", key)]);
        let resolved: Option<ResolvedInstance> = self.send(request).await?;
        resolved
            .map(|r| r.url)
            .ok_or_else(|| CacheError::Internal("registry answered without data".to_string()))
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<Option<T>> {
        let response = request.send().await.map_err(|e| {
            CacheError::RegistryUnavailable(format!("{}: {e}", self.base_url))
        })?;
        let status = response.status();
        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            CacheError::Internal(format!("registry answered {status} with bad body: {e}"))
        })?;
        debug!(registry = %self.base_url, %status, code = envelope.code, "registry answered");

        if status.is_success() && envelope.is_success() {
            return Ok(envelope.data);
        }
        Err(match envelope.code {
            400 => CacheError::RegistryValidation(envelope.msg),
            404 => CacheError::RegistryNotFound(envelope.msg),
            _ => CacheError::Internal(envelope.msg),
        })
    }
}
