//! Normalized retrieval result types.
//!
//! Every retriever (vector store, unified table, Jira, Git, code) maps its
//! rows into `Document` so the orchestrator can merge and rerank across
//! sources without caring where a hit came from.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Origin of a retrieved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Unified knowledge chunks.
    Knowledge,
    /// Jira tickets.
    Jira,
    /// Git commits.
    Git,
    /// Source code files.
    Code,
    /// Hits from the hosted document vector store.
    AomaVector,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Knowledge => "knowledge",
            Self::Jira => "jira",
            Self::Git => "git",
            Self::Code => "code",
            Self::AomaVector => "aoma_vector",
        }
    }

    /// Parse a `source_type` column value. Unknown values fall back to
    /// `Knowledge` so a new upstream source never breaks retrieval.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "jira" => Self::Jira,
            "git" => Self::Git,
            "code" => Self::Code,
            "aoma_vector" => Self::AomaVector,
            _ => Self::Knowledge,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single retrieval result, normalized across sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub content: String,
    pub source: SourceType,
    pub source_id: String,
    /// Relevance in [0, 1]; larger is more relevant.
    pub score: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>, source: SourceType, source_id: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            source,
            source_id: source_id.into(),
            score: score.clamp(0.0, 1.0),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// A raw hit from the hosted vector store's server-side search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub score: f64,
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
}

impl VectorHit {
    /// Display name for citation headers: filename when present, id otherwise.
    pub fn label(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.id)
    }
}
