//! Per-client token bucket rate limiting for the HTTP transport.
//!
//! Each client IP gets a bucket refilled continuously over the window:
//! 1000 requests per 15 minutes by default. Buckets for idle clients are
//! pruned opportunistically once the map grows.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Prune idle buckets once the map exceeds this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket limiter keyed by client IP.
#[derive(Debug)]
pub struct IpRateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    window: Duration,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl IpRateLimiter {
    /// `capacity` requests per `window` per client.
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill_per_sec: f64::from(capacity) / window.as_secs_f64(),
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Default budget: 1000 requests per 15 minutes.
    pub fn default_budget() -> Self {
        Self::new(1000, Duration::from_secs(15 * 60))
    }

    /// Try to take one token for the client; `false` means 429.
    pub fn try_acquire(&self, client: IpAddr) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");

        if buckets.len() > PRUNE_THRESHOLD {
            let window = self.window;
            buckets.retain(|_, b| now.duration_since(b.last_refill) < window);
        }

        let bucket = buckets.entry(client).or_insert(Bucket { tokens: self.capacity, last_refill: now });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn test_allows_up_to_capacity() {
        let limiter = IpRateLimiter::new(5, Duration::from_secs(900));
        for _ in 0..5 {
            assert!(limiter.try_acquire(ip(1)));
        }
        assert!(!limiter.try_acquire(ip(1)));
    }

    #[test]
    fn test_clients_have_independent_budgets() {
        let limiter = IpRateLimiter::new(1, Duration::from_secs(900));
        assert!(limiter.try_acquire(ip(1)));
        assert!(!limiter.try_acquire(ip(1)));
        assert!(limiter.try_acquire(ip(2)));
    }

    #[test]
    fn test_tokens_refill_over_time() {
        let limiter = IpRateLimiter::new(10, Duration::from_millis(100));
        for _ in 0..10 {
            assert!(limiter.try_acquire(ip(1)));
        }
        assert!(!limiter.try_acquire(ip(1)));
        std::thread::sleep(Duration::from_millis(50));
        assert!(limiter.try_acquire(ip(1)));
    }
}
