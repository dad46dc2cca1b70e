//! Request/response types for the LLM provider API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default chat model for synthesis.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

/// Default embedding model; 1536 dimensions.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Expected embedding dimension.
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Some model families only accept their fixed default temperature.
pub fn fixed_temperature(model: &str) -> Option<f32> {
    let pinned = model.starts_with("o1") || model.starts_with("o3") || model.starts_with("gpt-5");
    pinned.then_some(1.0)
}

/// A synchronous chat completion request, provider-agnostic shape.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: 1000,
            temperature: 0.2,
        }
    }

    pub fn with_budget(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Effective temperature, honoring models that pin theirs.
    pub fn effective_temperature(&self) -> f32 {
        fixed_temperature(&self.model).unwrap_or(self.temperature)
    }
}

/// One assistant-thread execution.
#[derive(Debug, Clone)]
pub struct AssistantRunRequest {
    pub assistant_id: String,
    pub user_message: String,
    pub additional_instructions: Option<String>,
    pub vector_store_ids: Vec<String>,
}

/// Assistant run lifecycle states as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
    RequiresAction,
    Cancelling,
    Incomplete,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Incomplete => "incomplete",
        }
    }
}

// Wire types below mirror the provider's JSON.

#[derive(Debug, Serialize)]
pub(crate) struct WireChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireChatMessage<'a>>,
    pub max_completion_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatChoice {
    pub message: WireChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatResponse {
    #[serde(default)]
    pub choices: Vec<WireChatChoice>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireEmbeddingsRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEmbeddingDatum {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEmbeddingsResponse {
    #[serde(default)]
    pub data: Vec<WireEmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireThread {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRunError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRun {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<WireRunError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessageText {
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum WireMessageContent {
    #[serde(rename = "text")]
    Text { text: WireMessageText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireThreadMessage {
    pub role: String,
    #[serde(default)]
    pub content: Vec<WireMessageContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessageList {
    #[serde(default)]
    pub data: Vec<WireThreadMessage>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireVectorSearchRequest<'a> {
    pub query: &'a str,
    pub max_num_results: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireVectorContent {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireVectorResult {
    pub file_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub content: Vec<WireVectorContent>,
    #[serde(default)]
    pub attributes: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireVectorSearchResponse {
    #[serde(default)]
    pub data: Vec<WireVectorResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_temperature_models() {
        assert_eq!(fixed_temperature("o3-mini"), Some(1.0));
        assert_eq!(fixed_temperature("gpt-5"), Some(1.0));
        assert_eq!(fixed_temperature("gpt-4o"), None);
    }

    #[test]
    fn test_effective_temperature_honors_pin() {
        let request = ChatRequest {
            model: "o3-mini".into(),
            system_prompt: String::new(),
            user_prompt: String::new(),
            max_tokens: 100,
            temperature: 0.1,
        };
        assert_eq!(request.effective_temperature(), 1.0);
    }

    #[test]
    fn test_run_status_terminality() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_run_status_parses_wire_values() {
        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, RunStatus::InProgress);
    }
}
