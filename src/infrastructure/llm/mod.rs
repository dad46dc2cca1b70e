//! LLM provider client: embeddings, chat, assistant runs, vector store.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::{LlmClientConfig, OpenAiClient};
pub use error::LlmApiError;
pub use retry::{RetryPolicy, Transient};
pub use types::{
    fixed_temperature, AssistantRunRequest, ChatRequest, RunStatus, DEFAULT_CHAT_MODEL,
    EMBEDDING_DIMENSION, EMBEDDING_MODEL,
};
