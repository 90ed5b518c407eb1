//! Request DTOs for the node and registry APIs
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::{Deserialize, Serialize};

/// Body of `POST /services` and `DELETE /services`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// Logical service (cluster) name
    #[serde(default)]
    pub service_name: String,
    /// Base URL of the instance, e.g. `http://localhost:8881`
    #[serde(default)]
    pub service_url: String,
}

impl RegistrationRequest {
    pub fn new(service_name: impl Into<String>, service_url: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_url: service_url.into(),
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.service_name.trim().is_empty() {
            return Some("serviceName cannot be empty".to_string());
        }
        if self.service_url.trim().is_empty() {
            return Some("serviceUrl cannot be empty".to_string());
        }
        if !(self.service_url.starts_with("http://") || self.service_url.starts_with("https://"))
        {
            return Some(format!(
                "serviceUrl must start with http:// or https://, got {}",
                self.service_url
            ));
        }
        None
    }
}

/// Body (POST) or query string (GET) of `/services/get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub key: String,
}

impl ResolveRequest {
    pub fn validate(&self) -> Option<String> {
        if self.service_name.trim().is_empty() {
            return Some("serviceName cannot be empty".to_string());
        }
        None
    }
}

/// Body of the membership push, `GET {instance}/updateNodePool`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePoolUpdate {
    pub urls: Vec<String>,
}

/// Query string of the client-facing `GET /api`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiQuery {
    #[serde(default)]
    pub key: String,
    /// Optional anti-loop token to forward
    pub code: Option<u64>,
}

/// Query string of the peer protocol route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeerQuery {
    pub code: Option<u64>,
}
