//! Response DTOs for the node and registry APIs
//!
//! Every JSON answer is wrapped in the `{"code","msg","data"}` envelope.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

/// Envelope code signalling success.
pub const SUCCESS_CODE: u16 = 200;

/// Generic response envelope: `{"code":int,"msg":string,"data":any}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            msg: "success".to_string(),
            data: Some(data),
        }
    }

    /// Failed envelope with no payload.
    pub fn fail(code: u16, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

impl Envelope<()> {
    /// Successful envelope with `"data": null`.
    pub fn ok() -> Self {
        Self {
            code: SUCCESS_CODE,
            msg: "success".to_string(),
            data: None,
        }
    }
}

/// `data` of a successful `/services/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInstance {
    pub url: String,
}

/// `data` of `/healthy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Per-controller entry of `/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerStats {
    pub name: String,
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl ControllerStats {
    pub fn new(name: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            name: name.into(),
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_serialize() {
        let env = Envelope::success(ResolvedInstance {
            url: "http://localhost:8111".to_string(),
        });
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["code"], 200);
        assert_eq!(json["msg"], "success");
        assert_eq!(json["data"]["url"], "http://localhost:8111");
    }

    #[test]
    fn test_ok_envelope_has_null_data() {
        let json = serde_json::to_value(Envelope::ok()).unwrap();
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_fail_envelope_roundtrip_code() {
        let env: Envelope<ResolvedInstance> = Envelope::fail(404, "missing");
        let text = serde_json::to_string(&env).unwrap();
        let back: Envelope<ResolvedInstance> = serde_json::from_str(&text).unwrap();
        assert!(!back.is_success());
        assert_eq!(back.msg, "missing");
    }

    #[test]
    fn test_controller_stats_flatten() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        let json = serde_json::to_value(ControllerStats::new("scores", stats)).unwrap();
        assert_eq!(json["name"], "scores");
        assert_eq!(json["hits"], 1);
        assert_eq!(json["hit_rate"], 0.5);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
