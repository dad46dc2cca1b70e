//! HTTP client for the Postgres-backed knowledge database's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::Value;

use crate::domain::ports::KnowledgeDb;
use crate::infrastructure::config::Environment;
use crate::infrastructure::llm::RetryPolicy;

use super::error::DbApiError;
use super::types::SelectQuery;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`SupabaseClient`].
#[derive(Debug, Clone)]
pub struct DbClientConfig {
    pub base_url: String,
    pub service_key: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl DbClientConfig {
    pub fn from_environment(env: &Environment) -> Self {
        Self {
            base_url: env.supabase_url.trim_end_matches('/').to_string(),
            service_key: env.supabase_service_key.clone(),
            timeout: env.timeout(),
            retry: RetryPolicy { max_retries: env.max_retries, ..RetryPolicy::default() },
        }
    }
}

/// Client for the database REST interface: stored procedures and selects.
pub struct SupabaseClient {
    http: ReqwestClient,
    config: DbClientConfig,
}

impl SupabaseClient {
    pub fn new(config: DbClientConfig) -> Result<Self, DbApiError> {
        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| DbApiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1{path}", self.config.base_url)
    }

    async fn parse_response(response: reqwest::Response) -> Result<Value, DbApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DbApiError::from_status(status, body));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| DbApiError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl KnowledgeDb for SupabaseClient {
    async fn rpc(&self, name: &str, params: Value) -> Result<Value, DbApiError> {
        self.config
            .retry
            .execute(|| {
                let url = self.rest_url(&format!("/rpc/{name}"));
                let params = params.clone();
                async move {
                    let response = self
                        .http
                        .post(url)
                        .header("apikey", &self.config.service_key)
                        .bearer_auth(&self.config.service_key)
                        .json(&params)
                        .send()
                        .await?;
                    Self::parse_response(response).await
                }
            })
            .await
    }

    async fn select(&self, query: SelectQuery) -> Result<Vec<Value>, DbApiError> {
        let result = self
            .config
            .retry
            .execute(|| {
                let url = self.rest_url(&format!("/{}", query.table));
                let pairs = query.query_pairs();
                async move {
                    let response = self
                        .http
                        .get(url)
                        .query(&pairs)
                        .header("apikey", &self.config.service_key)
                        .bearer_auth(&self.config.service_key)
                        .send()
                        .await?;
                    Self::parse_response(response).await
                }
            })
            .await?;
        match result {
            Value::Array(rows) => Ok(rows),
            other => Err(DbApiError::MalformedResponse(format!(
                "expected an array of rows, got {}",
                type_name(&other)
            ))),
        }
    }

    async fn probe(&self) -> Result<bool, DbApiError> {
        let response = self
            .http
            .head(self.rest_url("/"))
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
