//! Tool registry and dispatcher.
//!
//! Tools are registered declaratively: name, description, argument schema,
//! handler. The dispatcher owns the whole call pipeline — lookup,
//! sanitation, validation, deadline, metrics transition, result envelope —
//! so handlers stay pure functions of their arguments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde_json::{json, Value};

use crate::domain::errors::{ToolError, ToolResult};
use crate::infrastructure::logging::SecretScrubber;

use super::cache::{cache_key, ToolCache};
use super::metrics::MetricsRegistry;
use super::validation::ArgumentSchema;

/// Boxed async tool handler.
pub type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ToolResult<Value>> + Send + Sync>;

/// A registered tool.
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub schema: ArgumentSchema,
    pub handler: ToolHandler,
    /// When set, results are cached under `sha256(name + args)[..16]`.
    pub cache_ttl: Option<Duration>,
}

impl ToolDescriptor {
    /// Listing entry: the descriptor minus the handler.
    pub fn to_listing(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.schema.raw(),
        })
    }
}

/// Registration-ordered tool collection.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) {
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|i| &self.tools[*i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `tools/list` payload.
    pub fn listing(&self) -> Value {
        json!({ "tools": self.tools.iter().map(ToolDescriptor::to_listing).collect::<Vec<_>>() })
    }
}

/// Drives tool calls through validation, deadline, and metrics.
pub struct Dispatcher {
    registry: ToolRegistry,
    metrics: Arc<MetricsRegistry>,
    cache: Arc<ToolCache>,
    scrubber: SecretScrubber,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: ToolRegistry,
        metrics: Arc<MetricsRegistry>,
        cache: Arc<ToolCache>,
        timeout: Duration,
    ) -> Self {
        Self { registry, metrics, cache, scrubber: SecretScrubber::new(), timeout }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run a tool call end to end, returning the raw JSON result.
    ///
    /// Unknown tools are rejected before any metrics transition; every
    /// accepted call records exactly one success or failure.
    pub async fn call(&self, name: &str, arguments: Value) -> ToolResult<Value> {
        let Some(descriptor) = self.registry.get(name) else {
            return Err(ToolError::NotFound(format!("unknown tool: {name}")));
        };

        let started = Instant::now();
        let args = descriptor.schema.sanitize(arguments);

        if let Err(err) = descriptor.schema.validate(&args) {
            self.metrics.record(false, started.elapsed());
            tracing::warn!(tool = name, error = %err, "argument validation failed");
            return Err(err);
        }

        tracing::debug!(
            tool = name,
            args = %self.scrubber.scrub_json(&args),
            "dispatching tool call"
        );

        // Cacheable tools consult the TTL cache first; a hit still counts
        // as a completed request.
        let key = descriptor.cache_ttl.map(|_| cache_key(name, &args));
        if let Some(key) = &key {
            if let Some(value) = self.cache.get(key) {
                self.metrics.record_cache_access(true);
                self.metrics.record(true, started.elapsed());
                tracing::debug!(tool = name, "served from cache");
                return Ok(value);
            }
            self.metrics.record_cache_access(false);
        }

        let span = tracing::info_span!("tool_call", tool = name, request_id = %uuid::Uuid::new_v4());
        let outcome = tokio::time::timeout(
            self.timeout,
            tracing::Instrument::instrument((descriptor.handler)(args), span),
        )
        .await;
        let duration = started.elapsed();
        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout(self.timeout.as_millis() as u64)),
        };

        match &result {
            Ok(value) => {
                self.metrics.record(true, duration);
                if let (Some(key), Some(ttl)) = (key, descriptor.cache_ttl) {
                    self.cache.put(key, value.clone(), ttl);
                }
                tracing::info!(tool = name, duration_ms = duration.as_millis() as u64, "tool call succeeded");
            }
            Err(err) => {
                self.metrics.record(false, duration);
                tracing::warn!(
                    tool = name,
                    duration_ms = duration.as_millis() as u64,
                    error = %self.scrubber.scrub_text(&err.to_string()),
                    "tool call failed"
                );
            }
        }
        result
    }

    /// Run a tool call and wrap the result in the MCP content envelope.
    pub async fn call_envelope(&self, name: &str, arguments: Value) -> ToolResult<Value> {
        let result = self.call(name, arguments).await?;
        Ok(json!({
            "content": [{ "type": "text", "text": serde_json::to_string(&result)? }]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_descriptor(name: &str, cache_ttl: Option<Duration>) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: "echoes its arguments".to_string(),
            schema: ArgumentSchema::new(json!({
                "type": "object",
                "properties": { "query": { "type": "string", "minLength": 1 } },
                "required": ["query"]
            }))
            .unwrap(),
            handler: Arc::new(|args| Box::pin(async move { Ok(json!({ "echo": args })) })),
            cache_ttl,
        }
    }

    fn dispatcher_with(tools: Vec<ToolDescriptor>) -> Dispatcher {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        Dispatcher::new(
            registry,
            Arc::new(MetricsRegistry::new("test")),
            Arc::new(ToolCache::new()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found_and_unmetered() {
        let dispatcher = dispatcher_with(vec![echo_descriptor("echo", None)]);
        let err = dispatcher.call("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert_eq!(dispatcher.metrics.snapshot().total_requests, 0);
    }

    #[tokio::test]
    async fn test_validation_failure_counts_as_failed_request() {
        let dispatcher = dispatcher_with(vec![echo_descriptor("echo", None)]);
        let err = dispatcher.call("echo", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams(_)));
        let snapshot = dispatcher.metrics.snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.failed_requests, 1);
    }

    #[tokio::test]
    async fn test_success_records_one_transition() {
        let dispatcher = dispatcher_with(vec![echo_descriptor("echo", None)]);
        let result = dispatcher.call("echo", json!({"query": "hi"})).await.unwrap();
        assert_eq!(result["echo"]["query"], "hi");
        let snapshot = dispatcher.metrics.snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.successful_requests, 1);
        assert_eq!(snapshot.failed_requests, 0);
    }

    #[tokio::test]
    async fn test_cacheable_tool_served_from_cache() {
        let dispatcher = dispatcher_with(vec![echo_descriptor("echo", Some(Duration::from_secs(60)))]);
        dispatcher.call("echo", json!({"query": "hi"})).await.unwrap();
        dispatcher.call("echo", json!({"query": "hi"})).await.unwrap();
        let snapshot = dispatcher.metrics.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert!(snapshot.cache_hit_rate > 0.0);
    }

    #[tokio::test]
    async fn test_envelope_wraps_json_text() {
        let dispatcher = dispatcher_with(vec![echo_descriptor("echo", None)]);
        let envelope = dispatcher.call_envelope("echo", json!({"query": "hi"})).await.unwrap();
        assert_eq!(envelope["content"][0]["type"], "text");
        let inner: Value = serde_json::from_str(envelope["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(inner["echo"]["query"], "hi");
    }

    #[tokio::test]
    async fn test_handler_timeout_maps_to_timeout_error() {
        let slow = ToolDescriptor {
            name: "slow".to_string(),
            description: "sleeps past the deadline".to_string(),
            schema: ArgumentSchema::new(json!({"type": "object"})).unwrap(),
            handler: Arc::new(|_| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(json!(null))
                })
            }),
            cache_ttl: None,
        };
        let mut registry = ToolRegistry::new();
        registry.register(slow);
        let dispatcher = Dispatcher::new(
            registry,
            Arc::new(MetricsRegistry::new("test")),
            Arc::new(ToolCache::new()),
            Duration::from_millis(20),
        );
        let err = dispatcher.call("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
        assert_eq!(dispatcher.metrics.snapshot().failed_requests, 1);
    }
}
