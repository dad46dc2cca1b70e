//! Health status shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metrics::MetricsSnapshot;

/// Aggregated service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Result of probing a single upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    pub fn ok(latency_ms: u64) -> Self {
        Self { ok: true, latency_ms: Some(latency_ms), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { ok: false, latency_ms: None, error: Some(error.into()) }
    }
}

/// Snapshot returned by `get_system_health` and `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: OverallStatus,
    /// Keyed by service name; BTreeMap keeps the JSON deterministic.
    pub services: BTreeMap<String, ServiceHealth>,
    pub metrics: MetricsSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    /// Aggregate per-service results: all ok → healthy, some → degraded,
    /// none → unhealthy.
    pub fn aggregate(services: BTreeMap<String, ServiceHealth>, metrics: MetricsSnapshot) -> Self {
        let total = services.len();
        let healthy = services.values().filter(|s| s.ok).count();
        let status = if total > 0 && healthy == total {
            OverallStatus::Healthy
        } else if healthy > 0 {
            OverallStatus::Degraded
        } else {
            OverallStatus::Unhealthy
        };
        Self { status, services, metrics, timestamp: Utc::now() }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == OverallStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_map(states: &[(&str, bool)]) -> BTreeMap<String, ServiceHealth> {
        states
            .iter()
            .map(|(name, ok)| {
                let health = if *ok { ServiceHealth::ok(10) } else { ServiceHealth::failed("connect refused") };
                ((*name).to_string(), health)
            })
            .collect()
    }

    #[test]
    fn test_all_ok_is_healthy() {
        let status = HealthStatus::aggregate(probe_map(&[("openai", true), ("supabase", true)]), MetricsSnapshot::default());
        assert_eq!(status.status, OverallStatus::Healthy);
    }

    #[test]
    fn test_partial_ok_is_degraded() {
        let status = HealthStatus::aggregate(probe_map(&[("openai", true), ("supabase", false)]), MetricsSnapshot::default());
        assert_eq!(status.status, OverallStatus::Degraded);
    }

    #[test]
    fn test_none_ok_is_unhealthy() {
        let status = HealthStatus::aggregate(probe_map(&[("openai", false), ("supabase", false)]), MetricsSnapshot::default());
        assert_eq!(status.status, OverallStatus::Unhealthy);
    }
}
