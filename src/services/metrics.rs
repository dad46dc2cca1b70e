//! Request metrics.
//!
//! Counters are atomic; the running average and the cache hit-rate
//! estimator live behind a mutex so concurrent updates never tear.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::domain::models::MetricsSnapshot;

#[derive(Debug, Default)]
struct MetricsInner {
    average_response_ms: f64,
    cache_hit_rate: f64,
    last_request_time: Option<DateTime<Utc>>,
}

/// Server-wide request counters, owned by the server and shared read-only
/// with handlers.
#[derive(Debug)]
pub struct MetricsRegistry {
    started: Instant,
    version: String,
    total: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    inner: Mutex<MetricsInner>,
}

impl MetricsRegistry {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            started: Instant::now(),
            version: version.into(),
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            inner: Mutex::new(MetricsInner::default()),
        }
    }

    /// Record a completed tool call. Exactly one of success/failure per
    /// accepted call; the running average folds in the new duration.
    pub fn record(&self, success: bool, duration: Duration) {
        let n = self.total.fetch_add(1, Ordering::SeqCst) + 1;
        if success {
            self.success.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failure.fetch_add(1, Ordering::SeqCst);
        }
        let duration_ms = duration.as_secs_f64() * 1000.0;
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        let n = n as f64;
        inner.average_response_ms = (inner.average_response_ms * (n - 1.0) + duration_ms) / n;
        inner.last_request_time = Some(Utc::now());
    }

    /// Bump the exponential cache hit-rate estimator.
    pub fn record_cache_access(&self, hit: bool) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        let delta = if hit { 0.01 } else { -0.001 };
        inner.cache_hit_rate = (inner.cache_hit_rate + delta).clamp(0.0, 1.0);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().expect("metrics mutex poisoned");
        MetricsSnapshot {
            uptime_ms: self.started.elapsed().as_millis() as u64,
            total_requests: self.total.load(Ordering::SeqCst),
            successful_requests: self.success.load(Ordering::SeqCst),
            failed_requests: self.failure.load(Ordering::SeqCst),
            average_response_time_ms: inner.average_response_ms,
            cache_hit_rate: inner.cache_hit_rate,
            last_request_time: inner.last_request_time,
            version: self.version.clone(),
        }
    }
}
