//! Upstream health probing.
//!
//! Probes run in parallel with a 5s budget each. The aggregated snapshot
//! is cached for 30 seconds; a background loop refreshes it on the
//! configured interval so HTTP health checks answer from fresh state.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::models::{HealthStatus, ServiceHealth};
use crate::domain::ports::{KnowledgeDb, LanguageModel};

use super::metrics::MetricsRegistry;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const SNAPSHOT_TTL: Duration = Duration::from_secs(30);

/// Probes upstream services and caches the aggregate.
pub struct HealthService {
    llm: Arc<dyn LanguageModel>,
    db: Arc<dyn KnowledgeDb>,
    vector_store_id: Option<String>,
    metrics: Arc<MetricsRegistry>,
    interval: Duration,
    snapshot: RwLock<Option<(Instant, HealthStatus)>>,
}

impl HealthService {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        db: Arc<dyn KnowledgeDb>,
        vector_store_id: Option<String>,
        metrics: Arc<MetricsRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            llm,
            db,
            vector_store_id,
            metrics,
            interval,
            snapshot: RwLock::new(None),
        }
    }

    /// Freshest snapshot: cached when under 30s old, probed otherwise.
    pub async fn status(&self) -> HealthStatus {
        if let Some(cached) = self.cached() {
            return cached;
        }
        self.probe_now().await
    }

    fn cached(&self) -> Option<HealthStatus> {
        let guard = self.snapshot.read().expect("health lock poisoned");
        guard
            .as_ref()
            .filter(|(at, _)| at.elapsed() < SNAPSHOT_TTL)
            .map(|(_, status)| status.clone())
    }

    /// Run all probes in parallel and refresh the cached snapshot.
    pub async fn probe_now(&self) -> HealthStatus {
        let llm_probe = probe("openai", async {
            self.llm.models_probe().await.map_err(|e| e.to_string())
        });
        let db_probe = probe("supabase", async {
            self.db.probe().await.map_err(|e| e.to_string())
        });
        let vector_probe = async {
            match &self.vector_store_id {
                Some(store_id) => Some(
                    probe("vectorStore", async {
                        self.llm.vector_store_probe(store_id).await.map_err(|e| e.to_string())
                    })
                    .await,
                ),
                None => None,
            }
        };

        let (llm_result, db_result, vector_result) = tokio::join!(llm_probe, db_probe, vector_probe);

        let mut services = BTreeMap::new();
        services.insert(llm_result.0.to_string(), llm_result.1);
        services.insert(db_result.0.to_string(), db_result.1);
        if let Some((name, health)) = vector_result {
            services.insert(name.to_string(), health);
        }

        let status = HealthStatus::aggregate(services, self.metrics.snapshot());
        let mut guard = self.snapshot.write().expect("health lock poisoned");
        *guard = Some((Instant::now(), status.clone()));
        status
    }

    /// Background probe loop on the configured interval.
    pub fn spawn_probe_loop(self: &Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.interval);
            // First tick fires immediately; the startup probe already ran.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let status = service.probe_now().await;
                        tracing::debug!(status = ?status.status, "background health probe completed");
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

/// Run one probe under the 5s budget, measuring latency.
async fn probe<F>(name: &'static str, fut: F) -> (&'static str, ServiceHealth)
where
    F: std::future::Future<Output = Result<bool, String>>,
{
    let started = Instant::now();
    let health = match tokio::time::timeout(PROBE_TIMEOUT, fut).await {
        Ok(Ok(true)) => ServiceHealth::ok(started.elapsed().as_millis() as u64),
        Ok(Ok(false)) => ServiceHealth::failed("probe returned non-success status"),
        Ok(Err(error)) => ServiceHealth::failed(error),
        Err(_) => ServiceHealth::failed(format!("probe timed out after {}s", PROBE_TIMEOUT.as_secs())),
    };
    (name, health)
}
