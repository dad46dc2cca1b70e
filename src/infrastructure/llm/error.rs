//! Error types for LLM provider operations.

use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::ToolError;

/// Errors that can occur when talking to the LLM provider.
#[derive(Error, Debug, Clone)]
pub enum LlmApiError {
    /// Malformed request body or parameters (400).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed (401).
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Valid key, insufficient permissions (403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Upstream asked us to slow down (408/429).
    #[error("Rate limited or request timeout ({0})")]
    Throttled(StatusCode),

    /// Transient server-side error (5xx).
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Connection failed, DNS, timeout while connecting.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Unexpected status code.
    #[error("Unexpected response ({0}): {1}")]
    UnexpectedStatus(StatusCode, String),

    /// The provider returned no embedding for the input.
    #[error("no embedding")]
    NoEmbedding,

    /// Chat completion came back without assistant text.
    #[error("empty completion")]
    EmptyCompletion,

    /// An assistant run ended in a non-success terminal state.
    #[error("assistant run {status}: {message}")]
    RunTerminal { status: String, message: String },

    /// The assistant run outlived the configured deadline.
    #[error("assistant run exceeded {0}s deadline")]
    RunDeadline(u64),

    /// Response body did not parse.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmApiError {
    /// Classify an HTTP status and response body.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 => Self::InvalidApiKey,
            403 => Self::Forbidden(body),
            404 => Self::NotFound(body),
            408 | 429 => Self::Throttled(status),
            500..=599 => Self::ServerError(status, body),
            _ => Self::UnexpectedStatus(status, body),
        }
    }

    /// Whether the retry policy should try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttled(_) | Self::ServerError(_, _) | Self::NetworkError(_))
    }
}

impl super::retry::Transient for LlmApiError {
    fn is_transient(&self) -> bool {
        LlmApiError::is_transient(self)
    }
}

impl From<reqwest::Error> for LlmApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkError(err.to_string())
    }
}

impl From<LlmApiError> for ToolError {
    fn from(err: LlmApiError) -> Self {
        match err {
            LlmApiError::RunDeadline(secs) => ToolError::Timeout(secs * 1000),
            other => ToolError::Upstream(other.to_string()),
        }
    }
}
