//! Fast knowledge path over the hosted document vector store.
//!
//! The store does its own server-side semantic search, so no local
//! embedding is needed: search, filter by the strategy threshold, build a
//! cited context block, and ask the chat model for a synthesized answer.
//!
//! A slower assistant-thread path with the same external contract is kept
//! for deployments without a standalone vector store id; the assistant's
//! own file_search tool covers retrieval there.

use serde_json::{json, Value};

use crate::domain::errors::ToolResult;
use crate::domain::models::{QueryStrategy, VectorHit};
use crate::domain::ports::LanguageModel;
use crate::infrastructure::llm::{AssistantRunRequest, ChatRequest};

/// Maximum characters of a single document rendered into context.
const MAX_DOC_CHARS: usize = 2_000;

/// Appended when a document was cut at the budget.
const TRUNCATION_MARKER: &str = "... [truncated]";

/// Minimum results that must clear the threshold before filtering applies.
const MIN_FILTERED_RESULTS: usize = 3;

const SYSTEM_PROMPT: &str = "You are the AOMA knowledge assistant. Answer using only the supplied \
context documents. Cite the source filename for every claim, in the form (Source: <filename>). \
If the context does not contain the answer, say so explicitly.";

/// Answer a knowledge query through the vector-store fast path.
pub async fn fast_query(
    llm: &dyn LanguageModel,
    store_id: &str,
    query: &str,
    strategy: QueryStrategy,
    additional_context: Option<&str>,
    max_results: usize,
) -> ToolResult<Value> {
    let hits = llm.vector_store_search(store_id, query, max_results).await?;
    let selected = select_hits(hits, strategy);
    let context = build_context(&selected);

    let answer = llm
        .chat(
            ChatRequest::new(SYSTEM_PROMPT, user_prompt(query, &context, additional_context))
                .with_budget(strategy.max_completion_tokens(), strategy.temperature()),
        )
        .await?;

    Ok(json!({
        "answer": answer,
        "strategy": strategy.as_str(),
        "sources": selected
            .iter()
            .map(|hit| json!({ "filename": hit.label(), "score": hit.score }))
            .collect::<Vec<_>>(),
        "documentsUsed": selected.len(),
    }))
}

/// Same contract through an assistant run with file_search attached.
pub async fn assistant_query(
    llm: &dyn LanguageModel,
    assistant_id: &str,
    query: &str,
    strategy: QueryStrategy,
    additional_context: Option<&str>,
) -> ToolResult<Value> {
    let mut message = format!("Question: {query}");
    if let Some(extra) = additional_context {
        message.push_str(&format!("\n\nAdditional context: {extra}"));
    }
    let answer = llm
        .assistant_run(AssistantRunRequest {
            assistant_id: assistant_id.to_string(),
            user_message: message,
            additional_instructions: Some(format!(
                "Answer with source citations. Response depth: {}.",
                strategy.as_str()
            )),
            vector_store_ids: Vec::new(),
        })
        .await?;

    Ok(json!({
        "answer": answer,
        "strategy": strategy.as_str(),
        "sources": [],
        "documentsUsed": 0,
    }))
}

/// Threshold filter with a floor: results that clear the strategy
/// threshold win, capped per strategy; when none clear, the top three are
/// kept so the synthesis always has something to cite.
fn select_hits(mut hits: Vec<VectorHit>, strategy: QueryStrategy) -> Vec<VectorHit> {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    let threshold = strategy.score_threshold();
    let cleared = hits.iter().filter(|h| h.score >= threshold).count();
    if cleared == 0 {
        hits.truncate(MIN_FILTERED_RESULTS);
    } else {
        hits.truncate(cleared.min(strategy.max_context_documents()));
    }
    hits
}

/// Render selected documents with citation headers.
fn build_context(hits: &[VectorHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "[Source: {} (relevance: {:.2})]\n{}",
                hit.label(),
                hit.score,
                truncate_content(&hit.content)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Cap a document at the per-document character budget.
fn truncate_content(content: &str) -> String {
    if content.len() <= MAX_DOC_CHARS {
        return content.to_string();
    }
    let mut cut = MAX_DOC_CHARS;
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{TRUNCATION_MARKER}", &content[..cut])
}

fn user_prompt(query: &str, context: &str, additional_context: Option<&str>) -> String {
    let mut prompt = format!("Question: {query}\n\nContext from the AOMA knowledge base:\n{context}");
    if context.is_empty() {
        prompt = format!(
            "Question: {query}\n\nNo knowledge base documents matched this query. State clearly \
             that no sources were found before offering any general guidance."
        );
    }
    if let Some(extra) = additional_context {
        prompt.push_str(&format!("\n\nAdditional context from the caller:\n{extra}"));
    }
    prompt
}
