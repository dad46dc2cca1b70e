//! Generic TTL cache for tool results.
//!
//! Keys are the first 16 hex characters of `sha256(tool + canonical
//! arguments)`. Entries expire at `created_at + ttl`; a background sweeper
//! prunes expired entries every minute.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    created_at: Instant,
    ttl: Duration,
    hits: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

/// In-memory TTL cache shared across tool handlers.
#[derive(Debug, Default)]
pub struct ToolCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

/// Cache key for a tool call. serde_json maps are sorted, so equal
/// argument objects canonicalize to equal keys.
pub fn cache_key(tool: &str, args: &Value) -> String {
    let canonical = args.to_string();
    let digest = Sha256::digest(format!("{tool}{canonical}").as_bytes());
    let hex = format!("{digest:x}");
    hex[..16].to_string()
}

impl ToolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a live entry, bumping its hit count.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.write().expect("cache lock poisoned");
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(
            key.into(),
            CacheEntry { value, created_at: Instant::now(), ttl, hits: 0 },
        );
    }

    /// Drop expired entries; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the minute sweeper; stops when the shutdown channel fires.
    pub fn spawn_sweeper(self: &Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, "cache sweep removed expired entries");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}
