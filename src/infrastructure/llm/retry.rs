//! Retry policy with jittered exponential backoff for upstream requests.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

/// Errors a retry policy can classify.
pub trait Transient {
    /// Whether another attempt could plausibly succeed.
    fn is_transient(&self) -> bool;
}

/// Jittered exponential backoff.
///
/// Backoff base doubles with each retry, capped at `max_backoff_ms`; the
/// actual sleep is drawn uniformly from [base/2, base) so concurrent
/// callers don't stampede the upstream in lockstep.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self { max_retries, initial_backoff_ms, max_backoff_ms }
    }

    /// Execute an async operation, retrying transient failures.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !err.is_transient() || attempt >= self.max_retries {
                        return Err(err);
                    }
                    let backoff = self.backoff_for(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient upstream error, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Backoff base for a 0-indexed attempt, capped at the max.
    fn backoff_base_ms(&self, attempt: u32) -> u64 {
        self.initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms)
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let base = self.backoff_base_ms(attempt).max(1);
        let jittered = rand::rng().random_range(base / 2..=base);
        Duration::from_millis(jittered)
    }
}
