//! Shared fakes and fixtures for integration tests.
//!
//! The fakes implement the upstream ports with scripted responses and
//! record every call, so end-to-end tool behavior is deterministic.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use aoma_mesh::domain::models::VectorHit;
use aoma_mesh::domain::ports::{KnowledgeDb, LanguageModel};
use aoma_mesh::infrastructure::config::{DeployEnv, Environment, LogLevel};
use aoma_mesh::infrastructure::db::{DbApiError, SelectQuery};
use aoma_mesh::infrastructure::llm::{AssistantRunRequest, ChatRequest, LlmApiError};
use aoma_mesh::Server;

/// Scripted LLM with full call recording.
pub struct FakeLanguageModel {
    pub embedding: Vec<f32>,
    pub embed_error: Option<LlmApiError>,
    pub chat_response: String,
    pub chat_error: Option<LlmApiError>,
    pub assistant_response: String,
    pub vector_hits: Vec<VectorHit>,
    pub vector_error: Option<LlmApiError>,
    pub models_ok: bool,
    pub models_error: Option<LlmApiError>,
    pub store_ok: bool,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub assistant_requests: Mutex<Vec<AssistantRunRequest>>,
    pub vector_searches: Mutex<Vec<(String, String, usize)>>,
    pub embed_calls: Mutex<Vec<String>>,
}

impl Default for FakeLanguageModel {
    fn default() -> Self {
        Self {
            embedding: vec![0.1; 1536],
            embed_error: None,
            chat_response: "synthesized answer".to_string(),
            chat_error: None,
            assistant_response: "assistant analysis".to_string(),
            vector_hits: Vec::new(),
            vector_error: None,
            models_ok: true,
            models_error: None,
            store_ok: true,
            chat_requests: Mutex::new(Vec::new()),
            assistant_requests: Mutex::new(Vec::new()),
            vector_searches: Mutex::new(Vec::new()),
            embed_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeLanguageModel {
    pub fn with_hits(hits: Vec<VectorHit>) -> Self {
        Self { vector_hits: hits, ..Self::default() }
    }

    pub fn last_chat_request(&self) -> Option<ChatRequest> {
        self.chat_requests.lock().unwrap().last().cloned()
    }

    pub fn last_assistant_request(&self) -> Option<AssistantRunRequest> {
        self.assistant_requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for FakeLanguageModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmApiError> {
        self.embed_calls.lock().unwrap().push(text.to_string());
        match &self.embed_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.embedding.clone()),
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, LlmApiError> {
        self.chat_requests.lock().unwrap().push(request);
        match &self.chat_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.chat_response.clone()),
        }
    }

    async fn assistant_run(&self, request: AssistantRunRequest) -> Result<String, LlmApiError> {
        self.assistant_requests.lock().unwrap().push(request);
        Ok(self.assistant_response.clone())
    }

    async fn vector_store_search(
        &self,
        store_id: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VectorHit>, LlmApiError> {
        self.vector_searches
            .lock()
            .unwrap()
            .push((store_id.to_string(), query.to_string(), max_results));
        match &self.vector_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.vector_hits.clone()),
        }
    }

    async fn models_probe(&self) -> Result<bool, LlmApiError> {
        match &self.models_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.models_ok),
        }
    }

    async fn vector_store_probe(&self, _store_id: &str) -> Result<bool, LlmApiError> {
        Ok(self.store_ok)
    }
}

/// Scripted database with per-RPC responses and failure injection.
pub struct FakeKnowledgeDb {
    pub rpc_responses: Mutex<HashMap<String, Value>>,
    pub rpc_errors: Mutex<HashMap<String, DbApiError>>,
    pub select_rows: Mutex<Vec<Value>>,
    pub select_error: Option<DbApiError>,
    pub probe_ok: bool,
    pub probe_error: Option<DbApiError>,
    pub rpc_calls: Mutex<Vec<(String, Value)>>,
    pub select_calls: Mutex<Vec<SelectQuery>>,
}

impl Default for FakeKnowledgeDb {
    fn default() -> Self {
        Self {
            rpc_responses: Mutex::new(HashMap::new()),
            rpc_errors: Mutex::new(HashMap::new()),
            select_rows: Mutex::new(Vec::new()),
            select_error: None,
            probe_ok: true,
            probe_error: None,
            rpc_calls: Mutex::new(Vec::new()),
            select_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeKnowledgeDb {
    pub fn set_rpc(&self, name: &str, response: Value) {
        self.rpc_responses.lock().unwrap().insert(name.to_string(), response);
    }

    pub fn fail_rpc(&self, name: &str, error: DbApiError) {
        self.rpc_errors.lock().unwrap().insert(name.to_string(), error);
    }

    pub fn set_select_rows(&self, rows: Vec<Value>) {
        *self.select_rows.lock().unwrap() = rows;
    }

    pub fn rpc_call_names(&self) -> Vec<String> {
        self.rpc_calls.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn last_select(&self) -> Option<SelectQuery> {
        self.select_calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl KnowledgeDb for FakeKnowledgeDb {
    async fn rpc(&self, name: &str, params: Value) -> Result<Value, DbApiError> {
        self.rpc_calls.lock().unwrap().push((name.to_string(), params));
        if let Some(err) = self.rpc_errors.lock().unwrap().get(name) {
            return Err(err.clone());
        }
        Ok(self
            .rpc_responses
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| json!([])))
    }

    async fn select(&self, query: SelectQuery) -> Result<Vec<Value>, DbApiError> {
        self.select_calls.lock().unwrap().push(query);
        if let Some(err) = &self.select_error {
            return Err(err.clone());
        }
        Ok(self.select_rows.lock().unwrap().clone())
    }

    async fn probe(&self) -> Result<bool, DbApiError> {
        match &self.probe_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.probe_ok),
        }
    }
}

/// A validated-shape environment without touching process env vars.
pub fn test_environment() -> Environment {
    Environment {
        openai_api_key: "sk-test-0123456789abcdefghij".to_string(),
        assistant_id: "asst_test123".to_string(),
        vector_store_id: Some("vs_test123".to_string()),
        openai_base_url: None,
        supabase_url: "https://db.example.co".to_string(),
        supabase_service_key: "service-key-0123456789abcdef".to_string(),
        supabase_anon_key: "anon-key-0123456789abcdefgh".to_string(),
        jira_base_url: Some("https://jira.example.com".to_string()),
        http_port: 0,
        timeout_ms: 10_000,
        max_retries: 3,
        log_level: LogLevel::Info,
        health_check_interval_secs: 60,
        deploy_env: DeployEnv::Development,
        cors_allowed_origins: Vec::new(),
        tracing_project: None,
        tracing_api_key: None,
        tracing_endpoint: None,
        version: "0.1.0-test".to_string(),
    }
}

pub fn build_server(
    env: Environment,
    llm: Arc<FakeLanguageModel>,
    db: Arc<FakeKnowledgeDb>,
) -> Arc<Server> {
    Arc::new(Server::with_clients(env, llm, db).expect("server wiring failed"))
}
