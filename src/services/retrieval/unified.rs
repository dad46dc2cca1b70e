//! Unified retriever over the cross-source `unified_memory` table.

use serde_json::{json, Value};

use crate::domain::errors::ToolResult;
use crate::domain::models::{Document, SourceType};
use crate::domain::ports::{KnowledgeDb, LanguageModel};

/// Allowed `source_filter` values for the unified match RPC.
pub const SOURCE_FILTERS: &[&str] = &["all", "knowledge", "jira", "git"];

/// Embed the query and match against unified vectors, normalizing rows
/// into `Document`s with the score mirrored into metadata.
pub async fn search_unified(
    llm: &dyn LanguageModel,
    db: &dyn KnowledgeDb,
    query: &str,
    threshold: f64,
    count: usize,
    source_filter: &str,
) -> ToolResult<Vec<Document>> {
    let embedding = llm.embed(query).await?;
    let rows = db
        .rpc(
            "match_unified_vectors",
            json!({
                "query_embedding": embedding,
                "match_threshold": threshold,
                "match_count": count,
                "source_filter": source_filter,
            }),
        )
        .await?;

    let rows = rows.as_array().cloned().unwrap_or_default();
    Ok(rows.iter().map(row_to_document).collect())
}

fn row_to_document(row: &Value) -> Document {
    let source = row
        .get("source_type")
        .and_then(Value::as_str)
        .map(SourceType::parse_lossy)
        .unwrap_or(SourceType::Knowledge);
    let score = row.get("score").and_then(Value::as_f64).unwrap_or(0.0);
    let mut doc = Document::new(
        row.get("content").and_then(Value::as_str).unwrap_or_default(),
        source,
        row.get("source_id").and_then(Value::as_str).unwrap_or_default(),
        score,
    )
    .with_metadata("similarity", json!(score));
    if let Some(metadata) = row.get("metadata").filter(|m| m.is_object()) {
        doc = doc.with_metadata("upstream", metadata.clone());
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_normalization() {
        let row = json!({
            "source_id": "ITSM-42",
            "source_type": "jira",
            "content": "login fails after deploy",
            "score": 0.87,
            "metadata": { "project": "ITSM" }
        });
        let doc = row_to_document(&row);
        assert_eq!(doc.source, SourceType::Jira);
        assert_eq!(doc.source_id, "ITSM-42");
        assert!((doc.score - 0.87).abs() < f64::EPSILON);
        assert_eq!(doc.metadata["similarity"], json!(0.87));
    }

    #[test]
    fn test_missing_fields_default() {
        let doc = row_to_document(&json!({}));
        assert_eq!(doc.source, SourceType::Knowledge);
        assert_eq!(doc.score, 0.0);
        assert!(doc.content.is_empty());
    }
}
