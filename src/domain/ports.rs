//! Upstream client ports.
//!
//! Services depend on these traits rather than on reqwest, so retrieval,
//! orchestration, health, and the swarm controller can all run against
//! in-process fakes in tests. The request/response types live in the
//! infrastructure layer alongside the HTTP implementations.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::models::VectorHit;
use crate::infrastructure::db::{DbApiError, SelectQuery};
use crate::infrastructure::llm::{AssistantRunRequest, ChatRequest, LlmApiError};

/// Port for the hosted LLM provider: embeddings, chat completions,
/// assistant runs, and the document vector store attached to it.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Embed a short query into a single vector.
    ///
    /// Fails with an upstream error when the provider returns no embedding.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmApiError>;

    /// Synchronous chat completion; returns the assistant text.
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmApiError>;

    /// Run the preconfigured assistant to a terminal state and return the
    /// final assistant message text. Thread cleanup is best-effort.
    async fn assistant_run(&self, request: AssistantRunRequest) -> Result<String, LlmApiError>;

    /// Server-side semantic search over a hosted vector store.
    async fn vector_store_search(
        &self,
        store_id: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VectorHit>, LlmApiError>;

    /// HEAD probe against the models endpoint. 5s budget.
    async fn models_probe(&self) -> Result<bool, LlmApiError>;

    /// Probe a vector store's metadata. 5s budget.
    async fn vector_store_probe(&self, store_id: &str) -> Result<bool, LlmApiError>;
}

/// Port for the Postgres-backed knowledge database, reached through its
/// REST interface: named stored procedures plus simple table selects.
#[async_trait]
pub trait KnowledgeDb: Send + Sync {
    /// Invoke a named stored procedure. Returns the raw JSON result: an
    /// array of rows for table-returning procedures, a scalar for counts.
    async fn rpc(&self, name: &str, params: Value) -> Result<Value, DbApiError>;

    /// Filtered table select; supports equality, `in`, and a single
    /// `or(ilike)` predicate used by the text-search fallback.
    async fn select(&self, query: SelectQuery) -> Result<Vec<Value>, DbApiError>;

    /// HEAD probe against the API root. 5s budget.
    async fn probe(&self) -> Result<bool, DbApiError>;
}
