//! Semantic search over git commits and code files. No text fallback:
//! these RPCs either answer or the error surfaces.

use serde_json::{json, Value};

use crate::domain::errors::ToolResult;
use crate::domain::models::{CodeFile, Commit};
use crate::domain::ports::{KnowledgeDb, LanguageModel};

/// Filters accepted by the commit search RPC.
#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitFilters {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repository: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,
}

/// Filters accepted by the code file search RPC.
#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFilters {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repository: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub language: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_extension: Vec<String>,
}

pub async fn search_commits(
    llm: &dyn LanguageModel,
    db: &dyn KnowledgeDb,
    query: &str,
    filters: &CommitFilters,
    max_results: usize,
    threshold: f64,
) -> ToolResult<Vec<Commit>> {
    let embedding = llm.embed(query).await?;
    let rows = db
        .rpc(
            "search_git_commits_semantic",
            json!({
                "p_query_embedding": embedding,
                "p_similarity_threshold": threshold,
                "p_max_results": max_results,
                "p_filters": filters,
            }),
        )
        .await?;
    let rows = rows.as_array().cloned().unwrap_or_default();
    Ok(rows.iter().map(row_to_commit).collect())
}

pub async fn search_code(
    llm: &dyn LanguageModel,
    db: &dyn KnowledgeDb,
    query: &str,
    filters: &CodeFilters,
    max_results: usize,
    threshold: f64,
) -> ToolResult<Vec<CodeFile>> {
    let embedding = llm.embed(query).await?;
    let rows = db
        .rpc(
            "search_code_files_semantic",
            json!({
                "p_query_embedding": embedding,
                "p_similarity_threshold": threshold,
                "p_max_results": max_results,
                "p_filters": filters,
            }),
        )
        .await?;
    let rows = rows.as_array().cloned().unwrap_or_default();
    Ok(rows.iter().map(row_to_code_file).collect())
}

fn row_to_commit(row: &Value) -> Commit {
    Commit {
        hash: str_field(row, "commit_hash"),
        message: str_field(row, "commit_message"),
        author: opt_field(row, "author_name"),
        email: opt_field(row, "author_email"),
        date: opt_field(row, "commit_date"),
        repository: opt_field(row, "repository_name"),
        files_changed: row.get("files_changed").and_then(Value::as_i64),
        additions: row.get("additions").and_then(Value::as_i64),
        deletions: row.get("deletions").and_then(Value::as_i64),
        diff_summary: opt_field(row, "diff_summary"),
        similarity: row.get("similarity").and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 1.0),
    }
}

fn row_to_code_file(row: &Value) -> CodeFile {
    CodeFile {
        path: str_field(row, "file_path"),
        name: str_field(row, "file_name"),
        extension: opt_field(row, "file_extension"),
        language: opt_field(row, "language"),
        preview: opt_field(row, "content_preview"),
        summary: opt_field(row, "content_summary"),
        repository: opt_field(row, "repository_name"),
        line_count: row.get("line_count").and_then(Value::as_i64),
        last_modified: opt_field(row, "last_modified"),
        similarity: row.get("similarity").and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 1.0),
    }
}

fn str_field(row: &Value, key: &str) -> String {
    row.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn opt_field(row: &Value, key: &str) -> Option<String> {
    row.get(key).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_row_mapping() {
        let row = json!({
            "commit_hash": "abc123",
            "commit_message": "fix auth token refresh",
            "author_name": "Dev One",
            "author_email": "dev@example.com",
            "commit_date": "2025-11-02T10:00:00Z",
            "repository_name": "auth-service",
            "files_changed": 3,
            "additions": 40,
            "deletions": 12,
            "diff_summary": "refreshes tokens before expiry",
            "similarity": 0.83,
        });
        let commit = row_to_commit(&row);
        assert_eq!(commit.hash, "abc123");
        assert_eq!(commit.files_changed, Some(3));
        assert_eq!(commit.repository.as_deref(), Some("auth-service"));
    }

    #[test]
    fn test_code_file_row_mapping() {
        let row = json!({
            "file_path": "src/auth/session.rs",
            "file_name": "session.rs",
            "file_extension": "rs",
            "language": "rust",
            "content_preview": "pub struct Session ...",
            "repository_name": "auth-service",
            "line_count": 412,
            "similarity": 0.77,
        });
        let file = row_to_code_file(&row);
        assert_eq!(file.path, "src/auth/session.rs");
        assert_eq!(file.language.as_deref(), Some("rust"));
        assert_eq!(file.line_count, Some(412));
    }

    #[test]
    fn test_empty_filters_serialize_to_empty_object() {
        let filters = CommitFilters::default();
        assert_eq!(serde_json::to_value(&filters).unwrap(), json!({}));
    }
}
