//! Jira ticket search: semantic RPC first, table text-search fallback.

use serde_json::{json, Value};

use crate::domain::errors::{ToolError, ToolResult};
use crate::domain::models::{JiraFilters, JiraTicket, ProjectCount, TicketCount};
use crate::domain::ports::{KnowledgeDb, LanguageModel};
use crate::infrastructure::db::SelectQuery;

/// Similarity assigned to every text-fallback row.
const FALLBACK_SIMILARITY: f64 = 0.5;

/// Search tickets semantically; on any RPC-path failure fall back to a
/// plain `ilike` text search so the tool degrades instead of erroring.
pub async fn search_tickets(
    llm: &dyn LanguageModel,
    db: &dyn KnowledgeDb,
    jira_base_url: Option<&str>,
    query: &str,
    filters: &JiraFilters,
    max_results: usize,
    threshold: f64,
) -> ToolResult<Vec<JiraTicket>> {
    match semantic_search(llm, db, query, filters, max_results, threshold).await {
        Ok(tickets) => Ok(with_urls(tickets, jira_base_url)),
        Err(err) => {
            tracing::warn!(error = %err, "semantic Jira search failed, falling back to text search");
            let tickets = text_search(db, query, filters, max_results).await?;
            Ok(with_urls(tickets, jira_base_url))
        }
    }
}

async fn semantic_search(
    llm: &dyn LanguageModel,
    db: &dyn KnowledgeDb,
    query: &str,
    filters: &JiraFilters,
    max_results: usize,
    threshold: f64,
) -> ToolResult<Vec<JiraTicket>> {
    let embedding = llm.embed(query).await?;
    let rows = db
        .rpc(
            "match_jira_tickets",
            json!({
                "p_query_embedding": embedding,
                "p_similarity_threshold": threshold,
                "p_max_results": max_results,
                "p_filters": filters,
            }),
        )
        .await?;
    let rows = rows.as_array().cloned().unwrap_or_default();
    Ok(rows.iter().map(semantic_row_to_ticket).collect())
}

/// Plain text search over the tickets table: equality/`in` filters plus
/// `title ilike %q% or external_id ilike %q%`.
async fn text_search(
    db: &dyn KnowledgeDb,
    query: &str,
    filters: &JiraFilters,
    max_results: usize,
) -> ToolResult<Vec<JiraTicket>> {
    let mut select = SelectQuery::table("jira_tickets")
        .or_ilike(vec!["title".into(), "external_id".into()], query)
        .limit(max_results);
    if let Some(project) = &filters.project_key {
        select = select.eq("project_key", project);
    }
    select = select
        .any_of("status", filters.status.clone())
        .any_of("priority", filters.priority.clone());

    let rows = db.select(select).await?;
    Ok(rows.iter().map(text_row_to_ticket).collect())
}

fn semantic_row_to_ticket(row: &Value) -> JiraTicket {
    JiraTicket {
        key: str_field(row, &["ticket_key", "external_id", "key"]),
        summary: str_field(row, &["summary", "title"]),
        status: opt_str_field(row, "status"),
        priority: opt_str_field(row, "priority"),
        project: opt_str_field(row, "project_key").or_else(|| opt_str_field(row, "project")),
        url: None,
        similarity: row.get("similarity").and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 1.0),
    }
}

fn text_row_to_ticket(row: &Value) -> JiraTicket {
    JiraTicket {
        key: str_field(row, &["external_id", "ticket_key", "key"]),
        summary: str_field(row, &["title", "summary"]),
        status: opt_str_field(row, "status"),
        priority: opt_str_field(row, "priority"),
        project: opt_str_field(row, "project_key"),
        url: None,
        similarity: FALLBACK_SIMILARITY,
    }
}

fn with_urls(mut tickets: Vec<JiraTicket>, base_url: Option<&str>) -> Vec<JiraTicket> {
    if let Some(base) = base_url {
        let base = base.trim_end_matches('/');
        for ticket in &mut tickets {
            if !ticket.key.is_empty() {
                ticket.url = Some(format!("{base}/browse/{}", ticket.key));
            }
        }
    }
    tickets
}

/// Exact ticket counts via RPC, with a per-project breakdown when no
/// project filter narrows the scope.
pub async fn ticket_count(db: &dyn KnowledgeDb, filters: &JiraFilters) -> ToolResult<TicketCount> {
    let total = db.rpc("count_jira_tickets", json!({ "p_filters": filters })).await?;
    let total_count = scalar_count(&total)
        .ok_or_else(|| ToolError::Upstream("count_jira_tickets returned no count".to_string()))?;

    let project_breakdown = if filters.project_key.is_none() {
        let rows = db
            .rpc(
                "count_jira_tickets_by_project",
                json!({
                    "p_status_filter": filters.status,
                    "p_priority_filter": filters.priority,
                }),
            )
            .await?;
        let rows = rows.as_array().cloned().unwrap_or_default();
        Some(
            rows.iter()
                .map(|row| ProjectCount {
                    project: str_field(row, &["project_key", "project"]),
                    count: row
                        .get("ticket_count")
                        .or_else(|| row.get("count"))
                        .and_then(Value::as_i64)
                        .unwrap_or(0),
                })
                .collect(),
        )
    } else {
        None
    };

    Ok(TicketCount { total_count, project_breakdown })
}

/// Count RPCs may return a bare integer or a single-row array.
fn scalar_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Array(rows) => rows.first().and_then(|row| {
            row.as_i64()
                .or_else(|| row.get("count").and_then(Value::as_i64))
                .or_else(|| row.get("total_count").and_then(Value::as_i64))
        }),
        _ => None,
    }
}

fn str_field(row: &Value, candidates: &[&str]) -> String {
    candidates
        .iter()
        .find_map(|key| row.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn opt_str_field(row: &Value, key: &str) -> Option<String> {
    row.get(key).and_then(Value::as_str).map(String::from)
}
