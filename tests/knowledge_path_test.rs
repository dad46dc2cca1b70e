//! Fast knowledge path: threshold filtering, context build, token budget.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use aoma_mesh::domain::models::VectorHit;
use common::{build_server, test_environment, FakeKnowledgeDb, FakeLanguageModel};

fn hit(name: &str, score: f64) -> VectorHit {
    VectorHit {
        id: format!("file-{name}"),
        filename: Some(format!("{name}.md")),
        score,
        content: format!("short content for {name}"),
        metadata: Value::Null,
    }
}

#[tokio::test]
async fn test_focused_fast_path_uses_hits_above_threshold() {
    let llm = Arc::new(FakeLanguageModel::with_hits(vec![
        hit("hit1", 0.92),
        hit("hit2", 0.81),
        hit("hit3", 0.65),
        hit("hit4", 0.40),
    ]));
    let server = build_server(test_environment(), Arc::clone(&llm), Arc::new(FakeKnowledgeDb::default()));

    let result = server
        .dispatcher
        .call("query_aoma_knowledge", json!({ "query": "export pipeline recovery", "strategy": "focused" }))
        .await
        .unwrap();

    // Search went to the configured store.
    let searches = llm.vector_searches.lock().unwrap();
    assert_eq!(searches[0].0, "vs_test123");
    drop(searches);

    // Context holds exactly the two hits >= 0.70, with no truncation
    // marker for short content.
    let chat = llm.last_chat_request().expect("chat should be called");
    assert!(chat.user_prompt.contains("[Source: hit1.md (relevance: 0.92)]"));
    assert!(chat.user_prompt.contains("[Source: hit2.md (relevance: 0.81)]"));
    assert!(!chat.user_prompt.contains("hit3.md"));
    assert!(!chat.user_prompt.contains("[truncated]"));

    // Focused budget.
    assert_eq!(chat.max_tokens, 1000);

    // Citation surface: hit #1's filename is reported as a source.
    assert_eq!(result["sources"][0]["filename"], "hit1.md");
    assert_eq!(result["documentsUsed"], 2);
}

#[tokio::test]
async fn test_long_content_is_truncated_with_marker() {
    let mut long_hit = hit("big", 0.95);
    long_hit.content = "x".repeat(5_000);
    let llm = Arc::new(FakeLanguageModel::with_hits(vec![long_hit, hit("small", 0.90), hit("third", 0.89)]));
    let server = build_server(test_environment(), Arc::clone(&llm), Arc::new(FakeKnowledgeDb::default()));

    server
        .dispatcher
        .call("query_aoma_knowledge", json!({ "query": "big document", "strategy": "focused" }))
        .await
        .unwrap();

    let chat = llm.last_chat_request().unwrap();
    assert!(chat.user_prompt.contains("[truncated]"));
}

#[tokio::test]
async fn test_rapid_budget_and_document_cap() {
    let llm = Arc::new(FakeLanguageModel::with_hits(vec![
        hit("a", 0.95),
        hit("b", 0.91),
        hit("c", 0.88),
    ]));
    let server = build_server(test_environment(), Arc::clone(&llm), Arc::new(FakeKnowledgeDb::default()));

    let result = server
        .dispatcher
        .call("query_aoma_knowledge", json!({ "query": "quick check", "strategy": "rapid" }))
        .await
        .unwrap();

    let chat = llm.last_chat_request().unwrap();
    assert_eq!(chat.max_tokens, 500);
    assert_eq!(result["documentsUsed"], 2);
}

#[tokio::test]
async fn test_comprehensive_routes_through_ensemble() {
    let llm = Arc::new(FakeLanguageModel::with_hits(vec![hit("doc", 0.9)]));
    let db = Arc::new(FakeKnowledgeDb::default());
    db.set_rpc(
        "match_unified_vectors",
        json!([{ "source_id": "K-1", "source_type": "knowledge", "content": "chunk", "score": 0.8 }]),
    );
    let server = build_server(test_environment(), Arc::clone(&llm), Arc::clone(&db));

    let result = server
        .dispatcher
        .call("query_aoma_knowledge", json!({ "query": "deep dive", "strategy": "comprehensive" }))
        .await
        .unwrap();

    assert!(db.rpc_call_names().contains(&"match_unified_vectors".to_string()));
    assert_eq!(result["stats"]["supabase"], 1);
    assert_eq!(result["stats"]["openai"], 1);
    assert_eq!(result["stats"]["total"], 2);
}

#[tokio::test]
async fn test_no_vector_store_falls_back_to_assistant_path() {
    let mut env = test_environment();
    env.vector_store_id = None;
    let llm = Arc::new(FakeLanguageModel::default());
    let server = build_server(env, Arc::clone(&llm), Arc::new(FakeKnowledgeDb::default()));

    let result = server
        .dispatcher
        .call("query_aoma_knowledge", json!({ "query": "where are the runbooks?" }))
        .await
        .unwrap();

    let request = llm.last_assistant_request().expect("assistant path should run");
    assert_eq!(request.assistant_id, "asst_test123");
    assert!(request.user_message.contains("where are the runbooks?"));
    assert_eq!(result["answer"], "assistant analysis");
}

#[tokio::test]
async fn test_empty_query_is_invalid_params() {
    let server = build_server(
        test_environment(),
        Arc::new(FakeLanguageModel::default()),
        Arc::new(FakeKnowledgeDb::default()),
    );
    let err = server
        .dispatcher
        .call("query_aoma_knowledge", json!({ "query": "   " }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), -32602);
}
