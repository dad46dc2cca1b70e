//! Stdio JSON-RPC framing: handshake, dispatch, error codes, resources.

mod common;

use std::sync::Arc;

use serde_json::Value;

use aoma_mesh::adapters::mcp::StdioServer;
use common::{build_server, test_environment, FakeKnowledgeDb, FakeLanguageModel};

fn stdio() -> StdioServer {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    StdioServer::new(server)
}

async fn roundtrip(server: &StdioServer, frame: &str) -> Value {
    let response = server.handle_message(frame).await.expect("expected a response frame");
    serde_json::from_str(&response).expect("response frames are JSON")
}

#[tokio::test]
async fn test_initialize_handshake() {
    let server = stdio();
    let response = roundtrip(&server, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["serverInfo"]["name"], "aoma-mesh");
    assert!(response["result"]["protocolVersion"].is_string());
}

#[tokio::test]
async fn test_parse_error_is_32700() {
    let server = stdio();
    let response = roundtrip(&server, "{not json").await;
    assert_eq!(response["error"]["code"], -32700);
}

#[tokio::test]
async fn test_missing_method_is_invalid_request() {
    let server = stdio();
    let response = roundtrip(&server, r#"{"jsonrpc":"2.0","id":7}"#).await;
    assert_eq!(response["error"]["code"], -32600);
    assert_eq!(response["id"], 7);
}

#[tokio::test]
async fn test_unknown_method_is_32601() {
    let server = stdio();
    let response = roundtrip(&server, r#"{"jsonrpc":"2.0","id":2,"method":"prompts/list"}"#).await;
    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn test_unknown_tool_is_32601() {
    let server = stdio();
    let response = roundtrip(
        &server,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"no_such_tool","arguments":{}}}"#,
    )
    .await;
    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn test_invalid_params_carry_violation_data() {
    let server = stdio();
    let response = roundtrip(
        &server,
        r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"search_jira_tickets","arguments":{}}}"#,
    )
    .await;
    assert_eq!(response["error"]["code"], -32602);
    let violations = response["error"]["data"].as_array().expect("violation list expected");
    assert!(!violations.is_empty());
    assert!(violations[0]["message"].is_string());
}

#[tokio::test]
async fn test_notification_produces_no_response() {
    let server = stdio();
    let response = server
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(response.is_none());
}

#[tokio::test]
async fn test_tools_call_wraps_result_in_content_envelope() {
    let server = stdio();
    let response = roundtrip(
        &server,
        r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"get_server_capabilities","arguments":{}}}"#,
    )
    .await;
    let content = &response["result"]["content"][0];
    assert_eq!(content["type"], "text");
    let inner: Value = serde_json::from_str(content["text"].as_str().unwrap()).unwrap();
    assert_eq!(inner["name"], "aoma-mesh");
}

#[tokio::test]
async fn test_resources_list_and_read() {
    let server = stdio();
    let listing = roundtrip(&server, r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#).await;
    let resources = listing["result"]["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 4);

    let config = roundtrip(
        &server,
        r#"{"jsonrpc":"2.0","id":7,"method":"resources/read","params":{"uri":"aoma://config"}}"#,
    )
    .await;
    let contents = &config["result"]["contents"][0];
    assert_eq!(contents["mimeType"], "application/json");
    let text = contents["text"].as_str().unwrap();
    assert!(!text.contains("sk-test-"), "config resource must not leak keys");

    let docs = roundtrip(
        &server,
        r#"{"jsonrpc":"2.0","id":8,"method":"resources/read","params":{"uri":"aoma://docs"}}"#,
    )
    .await;
    let docs_contents = &docs["result"]["contents"][0];
    assert_eq!(docs_contents["mimeType"], "text/markdown");
    assert!(docs_contents["text"].as_str().unwrap().contains("query_aoma_knowledge"));
}

#[tokio::test]
async fn test_unknown_resource_is_32601() {
    let server = stdio();
    let response = roundtrip(
        &server,
        r#"{"jsonrpc":"2.0","id":9,"method":"resources/read","params":{"uri":"aoma://nope"}}"#,
    )
    .await;
    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn test_metrics_resource_reflects_calls() {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    server.dispatcher.call("get_server_capabilities", serde_json::json!({})).await.unwrap();
    let stdio = StdioServer::new(Arc::clone(&server));

    let metrics = roundtrip(
        &stdio,
        r#"{"jsonrpc":"2.0","id":10,"method":"resources/read","params":{"uri":"aoma://metrics"}}"#,
    )
    .await;
    let text = metrics["result"]["contents"][0]["text"].as_str().unwrap();
    let snapshot: Value = serde_json::from_str(text).unwrap();
    assert_eq!(snapshot["totalRequests"], 1);
    assert_eq!(snapshot["successfulRequests"], 1);
}
