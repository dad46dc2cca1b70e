//! HTTP client for the LLM provider.
//!
//! Covers the four surfaces the server uses: embeddings, synchronous chat
//! completions, assistant threads/runs, and hosted vector store search.
//! Transient failures are retried with jittered backoff; permanent errors
//! surface immediately.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::sleep;

use crate::domain::models::VectorHit;
use crate::domain::ports::LanguageModel;
use crate::infrastructure::config::Environment;

use super::error::LlmApiError;
use super::retry::RetryPolicy;
use super::types::{
    AssistantRunRequest, ChatRequest, RunStatus, WireChatMessage, WireChatRequest,
    WireChatResponse, WireEmbeddingsRequest, WireEmbeddingsResponse, WireMessageContent,
    WireMessageList, WireRun, WireThread, WireVectorSearchRequest, WireVectorSearchResponse,
    EMBEDDING_MODEL,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const RUN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout and assistant-run deadline.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl LlmClientConfig {
    pub fn from_environment(env: &Environment) -> Self {
        Self {
            api_key: env.openai_api_key.clone(),
            base_url: env.openai_base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: env.timeout(),
            retry: RetryPolicy { max_retries: env.max_retries, ..RetryPolicy::default() },
        }
    }
}

/// Production client for the LLM provider API.
pub struct OpenAiClient {
    http: ReqwestClient,
    config: LlmClientConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmClientConfig) -> Result<Self, LlmApiError> {
        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| LlmApiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// POST a JSON body and parse the JSON response. The assistants API
    /// requires a beta opt-in header.
    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        assistants: bool,
    ) -> Result<R, LlmApiError> {
        let mut request = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.config.api_key)
            .json(body);
        if assistants {
            request = request.header("OpenAI-Beta", "assistants=v2");
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(LlmApiError::from_status(status, body));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| LlmApiError::MalformedResponse(e.to_string()))
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str, assistants: bool) -> Result<R, LlmApiError> {
        let mut request = self.http.get(self.url(path)).bearer_auth(&self.config.api_key);
        if assistants {
            request = request.header("OpenAI-Beta", "assistants=v2");
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmApiError::from_status(status, body));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| LlmApiError::MalformedResponse(e.to_string()))
    }

    /// Delete a thread; failures are the caller's to log, not to propagate.
    async fn delete_thread(&self, thread_id: &str) -> Result<(), LlmApiError> {
        let response = self
            .http
            .delete(self.url(&format!("/threads/{thread_id}")))
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmApiError::from_status(status, body));
        }
        Ok(())
    }

    /// Poll a run at 1s intervals until terminal or past the deadline.
    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<(), LlmApiError> {
        let deadline = Instant::now() + self.config.timeout;
        loop {
            let run: WireRun = self
                .get_json(&format!("/threads/{thread_id}/runs/{run_id}"), true)
                .await?;
            match run.status {
                RunStatus::Completed => return Ok(()),
                status if status.is_terminal() => {
                    let message = run.last_error.map(|e| e.message).unwrap_or_default();
                    return Err(LlmApiError::RunTerminal { status: status.as_str().to_string(), message });
                }
                _ => {}
            }
            if Instant::now() >= deadline {
                return Err(LlmApiError::RunDeadline(self.config.timeout.as_secs()));
            }
            sleep(RUN_POLL_INTERVAL).await;
        }
    }

    /// Last assistant message text from a thread, newest first.
    async fn latest_assistant_text(&self, thread_id: &str) -> Result<String, LlmApiError> {
        let list: WireMessageList = self
            .get_json(&format!("/threads/{thread_id}/messages?order=desc&limit=10"), true)
            .await?;
        let text = list
            .data
            .into_iter()
            .find(|m| m.role == "assistant")
            .map(|m| {
                m.content
                    .into_iter()
                    .filter_map(|c| match c {
                        WireMessageContent::Text { text } => Some(text.value),
                        WireMessageContent::Other => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(LlmApiError::EmptyCompletion);
        }
        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmApiError> {
        let response: WireEmbeddingsResponse = self
            .config
            .retry
            .execute(|| {
                let body = WireEmbeddingsRequest { model: EMBEDDING_MODEL, input: text };
                async move { self.post_json("/embeddings", &body, false).await }
            })
            .await?;
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        data.into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or(LlmApiError::NoEmbedding)
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, LlmApiError> {
        let response: WireChatResponse = self
            .config
            .retry
            .execute(|| {
                let body = WireChatRequest {
                    model: &request.model,
                    messages: vec![
                        WireChatMessage { role: "system", content: &request.system_prompt },
                        WireChatMessage { role: "user", content: &request.user_prompt },
                    ],
                    max_completion_tokens: request.max_tokens,
                    temperature: request.effective_temperature(),
                };
                async move { self.post_json("/chat/completions", &body, false).await }
            })
            .await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmApiError::EmptyCompletion)
    }

    async fn assistant_run(&self, request: AssistantRunRequest) -> Result<String, LlmApiError> {
        let thread: WireThread = self.post_json("/threads", &serde_json::json!({}), true).await?;
        let thread_id = thread.id;

        let result: Result<String, LlmApiError> = async {
            self.post_json::<_, serde_json::Value>(
                &format!("/threads/{thread_id}/messages"),
                &serde_json::json!({ "role": "user", "content": request.user_message }),
                true,
            )
            .await?;

            let mut run_body = serde_json::json!({ "assistant_id": request.assistant_id });
            if let Some(instructions) = &request.additional_instructions {
                run_body["additional_instructions"] = serde_json::json!(instructions);
            }
            if !request.vector_store_ids.is_empty() {
                run_body["tools"] = serde_json::json!([{ "type": "file_search" }]);
                run_body["tool_resources"] = serde_json::json!({
                    "file_search": { "vector_store_ids": request.vector_store_ids }
                });
            }
            let run: WireRun = self
                .post_json(&format!("/threads/{thread_id}/runs"), &run_body, true)
                .await?;

            self.wait_for_run(&thread_id, &run.id).await?;
            self.latest_assistant_text(&thread_id).await
        }
        .await;

        if let Err(err) = self.delete_thread(&thread_id).await {
            tracing::warn!(thread_id = %thread_id, error = %err, "failed to delete assistant thread");
        }

        result
    }

    async fn vector_store_search(
        &self,
        store_id: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VectorHit>, LlmApiError> {
        let response: WireVectorSearchResponse = self
            .config
            .retry
            .execute(|| {
                let body = WireVectorSearchRequest { query, max_num_results: max_results };
                let path = format!("/vector_stores/{store_id}/search");
                async move { self.post_json(&path, &body, false).await }
            })
            .await?;
        Ok(response
            .data
            .into_iter()
            .map(|hit| VectorHit {
                id: hit.file_id,
                filename: hit.filename,
                score: hit.score.clamp(0.0, 1.0),
                content: hit
                    .content
                    .into_iter()
                    .map(|c| c.text)
                    .collect::<Vec<_>>()
                    .join("\n"),
                metadata: hit.attributes,
            })
            .collect())
    }

    async fn models_probe(&self) -> Result<bool, LlmApiError> {
        let response = self
            .http
            .head(self.url("/models"))
            .bearer_auth(&self.config.api_key)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn vector_store_probe(&self, store_id: &str) -> Result<bool, LlmApiError> {
        let response = self
            .http
            .get(self.url(&format!("/vector_stores/{store_id}")))
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}
