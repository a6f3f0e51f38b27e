use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Healthy,
    Unhealthy,
}

/// Body of the bare liveness probe. Sent without the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Liveness {
    pub status: HealthStatus,
    pub timestamp: String,
}

/// Detailed health report sent inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: String,
    /// Seconds since the process started.
    pub uptime: f64,
    pub environment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&HealthStatus::Unhealthy).unwrap(), r#""unhealthy""#);
        assert_eq!(serde_json::to_string(&HealthStatus::Ok).unwrap(), r#""ok""#);
    }
}
