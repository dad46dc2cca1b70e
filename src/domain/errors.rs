//! Tool-layer error taxonomy.
//!
//! Handlers never surface typed errors across a transport; transports map
//! these onto JSON-RPC error objects (stdio) or HTTP error bodies. Messages
//! stay short and never carry API keys or full prompts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single argument validation failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer-ish path into the argument object.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors a tool call can surface to a client.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Malformed envelope or unusable request shape.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Argument schema validation failed.
    #[error("Invalid parameters: {}", summarize(.0))]
    InvalidParams(Vec<Violation>),

    /// Unknown tool or resource URI.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The LLM or database upstream failed after retries.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The handler exceeded its deadline.
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Anything else; the message is sanitized.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn invalid_params(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams(vec![Violation { path: path.into(), message: message.into() }])
    }

    /// JSON-RPC 2.0 error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidRequest(_) => -32600,
            Self::NotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Upstream(_) | Self::Timeout(_) | Self::Internal(_) => -32603,
        }
    }

    /// Structured `data` payload for JSON-RPC error objects, when any.
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidParams(violations) => serde_json::to_value(violations).ok(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
