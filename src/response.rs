use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Body returned by a successful shorten.
#[derive(Debug, Clone, Serialize)]
pub struct ShortenResponse {
    pub url: String,
    pub short: String,
    /// Hours
    pub expiry: u64,
    pub rate_limit: i64,
    /// Minutes until the client's quota resets
    pub rate_limit_res: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub backend: String,
    pub dependencies: DependencyStatus,
}

#[derive(Debug, Serialize)]
pub struct DependencyStatus {
    pub links: ServiceStatus,
    pub quota: ServiceStatus,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: String,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceStatus {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            response_time_ms,
            error: None,
        }
    }

    pub fn unavailable(response_time_ms: u64, error: String) -> Self {
        Self {
            status: "unavailable".to_string(),
            response_time_ms,
            error: Some(error),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl HealthResponse {
    pub fn new(uptime_seconds: u64, backend: &str, dependencies: DependencyStatus) -> Self {
        let status = if dependencies.links.is_healthy() && dependencies.quota.is_healthy() {
            "healthy"
        } else {
            "degraded"
        };

        Self {
            status: status.to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds,
            backend: backend.to_string(),
            dependencies,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_response_wire_names() {
        let response = ShortenResponse {
            url: "http://example.com".to_string(),
            short: "localhost:3000/abc123".to_string(),
            expiry: 24,
            rate_limit: 9,
            rate_limit_res: 29,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "url": "http://example.com",
                "short": "localhost:3000/abc123",
                "expiry": 24,
                "rate_limit": 9,
                "rate_limit_res": 29
            })
        );
    }

    #[test]
    fn test_degraded_when_a_namespace_is_down() {
        let health = HealthResponse::new(
            10,
            "redis",
            DependencyStatus {
                links: ServiceStatus::healthy(1),
                quota: ServiceStatus::unavailable(3, "Ping failed".to_string()),
            },
        );

        assert_eq!(health.status, "degraded");
        let json = serde_json::to_string(&health).unwrap();
        assert!(json.contains("Ping failed"));
    }
}
