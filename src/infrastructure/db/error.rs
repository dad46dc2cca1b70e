//! Error types for knowledge database operations.

use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::ToolError;
use crate::infrastructure::llm::retry::Transient;

/// Errors from the database's REST interface.
#[derive(Error, Debug, Clone)]
pub enum DbApiError {
    /// Bad filter syntax or unknown column (400).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Service key rejected (401/403).
    #[error("Unauthorized")]
    Unauthorized,

    /// Unknown table or RPC (404).
    #[error("Not found: {0}")]
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

    /// Response body did not parse.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl DbApiError {
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => Self::InvalidQuery(body),
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound(body),
            408 | 429 => Self::Throttled(status),
            500..=599 => Self::ServerError(status, body),
            _ => Self::UnexpectedStatus(status, body),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttled(_) | Self::ServerError(_, _) | Self::NetworkError(_))
    }
}

impl Transient for DbApiError {
    fn is_transient(&self) -> bool {
        DbApiError::is_transient(self)
    }
}

impl From<reqwest::Error> for DbApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkError(err.to_string())
    }
}

impl From<DbApiError> for ToolError {
    fn from(err: DbApiError) -> Self {
        ToolError::Upstream(err.to_string())
    }
}
