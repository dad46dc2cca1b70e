//! Ensemble retrieval and synthesis.
//!
//! Fans out to the unified retriever and the hosted vector store in
//! parallel, merges by score, keeps the strategy's Top-N, and asks the
//! chat model for a cited answer. A failing branch degrades to an empty
//! list; the call never aborts on partial failure.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::domain::errors::ToolResult;
use crate::domain::models::{Document, QueryStrategy, SourceType};
use crate::domain::ports::{KnowledgeDb, LanguageModel};
use crate::infrastructure::llm::ChatRequest;

use super::retrieval::unified;

const SYSTEM_PROMPT: &str = "You are the AOMA engineering knowledge assistant. Synthesize an \
answer from the numbered context sources, citing them as [Source N]. Prefer higher-similarity \
sources when they disagree. If no sources are listed, state clearly that the answer is not \
grounded in retrieved material.";

/// How many candidates each branch is asked for before the global rerank.
const BRANCH_CANDIDATES: usize = 20;

/// Match threshold handed to the unified retriever.
const UNIFIED_THRESHOLD: f64 = 0.3;

/// Run the full ensemble: parallel fan-out, rerank, Top-N, synthesis.
pub async fn ensemble_query(
    llm: &dyn LanguageModel,
    db: &dyn KnowledgeDb,
    vector_store_id: Option<&str>,
    query: &str,
    strategy: QueryStrategy,
    additional_context: Option<&str>,
) -> ToolResult<Value> {
    let unified_branch = async {
        match unified::search_unified(llm, db, query, UNIFIED_THRESHOLD, BRANCH_CANDIDATES, "all").await {
            Ok(documents) => documents,
            Err(err) => {
                tracing::warn!(error = %err, "unified retriever failed, continuing without it");
                Vec::new()
            }
        }
    };
    let vector_branch = async {
        let Some(store_id) = vector_store_id else { return Vec::new() };
        match llm.vector_store_search(store_id, query, BRANCH_CANDIDATES).await {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| {
                    let mut doc = Document::new(hit.content, SourceType::AomaVector, hit.id, hit.score);
                    if let Some(filename) = hit.filename {
                        doc = doc.with_metadata("filename", json!(filename));
                    }
                    doc
                })
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "vector store retriever failed, continuing without it");
                Vec::new()
            }
        }
    };

    let (unified_docs, vector_docs) = tokio::join!(unified_branch, vector_branch);
    let supabase_count = unified_docs.len();
    let openai_count = vector_docs.len();

    let selected = rerank(unified_docs, vector_docs, strategy.ensemble_top_n());
    let context = render_context(&selected);

    let answer = llm
        .chat(
            ChatRequest::new(SYSTEM_PROMPT, user_prompt(query, &context, additional_context))
                .with_budget(strategy.max_completion_tokens(), strategy.temperature()),
        )
        .await?;

    let mut by_source_type: BTreeMap<&'static str, usize> = BTreeMap::new();
    for doc in &selected {
        *by_source_type.entry(doc.source.as_str()).or_default() += 1;
    }

    Ok(json!({
        "answer": answer,
        "sourceDocuments": selected,
        "stats": {
            "supabase": supabase_count,
            "openai": openai_count,
            "total": supabase_count + openai_count,
            "bySourceType": by_source_type,
        },
    }))
}

/// Merge both branches and stable-sort by similarity descending: equal
/// scores keep first-seen order, and no per-source quota applies.
fn rerank(unified_docs: Vec<Document>, vector_docs: Vec<Document>, top_n: usize) -> Vec<Document> {
    let mut merged = unified_docs;
    merged.extend(vector_docs);
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(top_n);
    merged
}

fn render_context(documents: &[Document]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "[Source {}: {}/{} (similarity: {:.3})]\n{}",
                i + 1,
                doc.source,
                doc.source_id,
                doc.score,
                doc.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn user_prompt(query: &str, context: &str, additional_context: Option<&str>) -> String {
    let mut prompt = if context.is_empty() {
        format!(
            "Question: {query}\n\nNo sources were retrieved from any backend. State this clearly \
             in your answer before offering any general guidance."
        )
    } else {
        format!("Context sources:\n{context}\n\nQuestion: {query}")
    };
    if let Some(extra) = additional_context {
        prompt.push_str(&format!("\n\nAdditional context from the caller:\n{extra}"));
    }
    prompt
}
