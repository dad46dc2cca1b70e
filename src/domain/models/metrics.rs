//! Metrics snapshot shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the server's counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Milliseconds since process start.
    pub uptime_ms: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
    /// Exponential estimator in [0, 1].
    pub cache_hit_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_request_time: Option<DateTime<Utc>>,
    pub version: String,
}
