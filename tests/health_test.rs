//! Health aggregation and transport behavior.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;

use aoma_mesh::adapters::mcp;
use aoma_mesh::infrastructure::db::DbApiError;
use common::{build_server, test_environment, FakeKnowledgeDb, FakeLanguageModel};

fn degraded_fakes() -> (Arc<FakeLanguageModel>, Arc<FakeKnowledgeDb>) {
    let llm = Arc::new(FakeLanguageModel::default());
    let db = Arc::new(FakeKnowledgeDb {
        probe_error: Some(DbApiError::NetworkError("connect refused".into())),
        ..FakeKnowledgeDb::default()
    });
    (llm, db)
}

#[tokio::test]
async fn test_degraded_when_database_probe_fails() {
    let (llm, db) = degraded_fakes();
    let server = build_server(test_environment(), llm, db);

    let result = server.dispatcher.call("get_system_health", json!({})).await.unwrap();

    assert_eq!(result["status"], "degraded");
    assert_eq!(result["services"]["openai"]["ok"], true);
    assert!(result["services"]["openai"]["latencyMs"].is_number());
    assert_eq!(result["services"]["supabase"]["ok"], false);
    assert!(result["services"]["supabase"]["error"].as_str().unwrap().contains("connect refused"));
    assert_eq!(result["services"]["vectorStore"]["ok"], true);
}

#[tokio::test]
async fn test_healthy_when_all_probes_pass() {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    let result = server.dispatcher.call("get_system_health", json!({})).await.unwrap();
    assert_eq!(result["status"], "healthy");
}

#[tokio::test]
async fn test_unhealthy_when_nothing_answers() {
    let llm = Arc::new(FakeLanguageModel { models_ok: false, store_ok: false, ..FakeLanguageModel::default() });
    let db = Arc::new(FakeKnowledgeDb { probe_ok: false, ..FakeKnowledgeDb::default() });
    let server = build_server(test_environment(), llm, db);
    let result = server.dispatcher.call("get_system_health", json!({})).await.unwrap();
    assert_eq!(result["status"], "unhealthy");
}

#[tokio::test]
async fn test_vector_store_probe_absent_when_unconfigured() {
    let mut env = test_environment();
    env.vector_store_id = None;
    let server = build_server(env, Arc::new(FakeLanguageModel::default()), Arc::new(FakeKnowledgeDb::default()));
    let result = server.dispatcher.call("get_system_health", json!({})).await.unwrap();
    assert!(result["services"].get("vectorStore").is_none());
}

#[tokio::test]
async fn test_include_flags_shape_response() {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    let bare = server
        .dispatcher
        .call("get_system_health", json!({ "includeMetrics": false }))
        .await
        .unwrap();
    assert!(bare.get("metrics").is_none());

    let diagnostic = server
        .dispatcher
        .call("get_system_health", json!({ "includeDiagnostics": true }))
        .await
        .unwrap();
    assert!(diagnostic["diagnostics"]["config"]["version"].is_string());
}

async fn spawn_http(server: Arc<aoma_mesh::Server>) -> SocketAddr {
    let app = mcp::router(server).into_make_service_with_connect_info::<SocketAddr>();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_http_health_returns_503_when_degraded() {
    let (llm, db) = degraded_fakes();
    let server = build_server(test_environment(), llm, db);
    let addr = spawn_http(server).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_http_health_returns_200_when_healthy() {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    let addr = spawn_http(server).await;
    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_metrics_and_discovery() {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    let addr = spawn_http(server).await;

    let metrics: serde_json::Value = reqwest::get(format!("http://{addr}/metrics")).await.unwrap().json().await.unwrap();
    assert!(metrics["uptimeMs"].is_number());
    assert_eq!(metrics["version"], "0.1.0-test");

    let discovery: serde_json::Value =
        reqwest::get(format!("http://{addr}/.well-known/mcp")).await.unwrap().json().await.unwrap();
    assert_eq!(discovery["name"], "aoma-mesh");
    assert_eq!(discovery["endpoints"]["rpc"], "/rpc");

    let registry: serde_json::Value = reqwest::get(format!("http://{addr}/registry")).await.unwrap().json().await.unwrap();
    assert_eq!(registry["toolCount"], 9);
    assert_eq!(registry["health"], "/health");
}

#[tokio::test]
async fn test_http_rpc_accepts_only_tools_call() {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    let addr = spawn_http(server).await;
    let client = reqwest::Client::new();

    let rejected = client
        .post(format!("http://{addr}/rpc"))
        .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 400);

    let accepted = client
        .post(format!("http://{addr}/rpc"))
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "get_server_capabilities", "arguments": {} }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);
    let body: serde_json::Value = accepted.json().await.unwrap();
    assert_eq!(body["id"], 2);
    assert_eq!(body["result"]["content"][0]["type"], "text");
}

#[tokio::test]
async fn test_http_direct_tool_call_and_error_body() {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    let addr = spawn_http(server).await;
    let client = reqwest::Client::new();

    let ok = client
        .post(format!("http://{addr}/tools/get_server_capabilities"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let body: serde_json::Value = ok.json().await.unwrap();
    assert_eq!(body["name"], "aoma-mesh");

    let err = client
        .post(format!("http://{addr}/tools/no_such_tool"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(err.status(), 500);
    let body: serde_json::Value = err.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("no_such_tool"));
    assert!(body["timestamp"].is_string());
}
