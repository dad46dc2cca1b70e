//! Jira ticket result shapes and search filters.

use serde::{Deserialize, Serialize};

/// A Jira ticket returned by semantic or text search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraTicket {
    pub key: String,
    pub summary: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    /// Browse URL, present when a Jira base URL is configured.
    #[serde(default)]
    pub url: Option<String>,
    pub similarity: f64,
}

/// Filters shared by Jira search and count operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority: Vec<String>,
}

impl JiraFilters {
    pub fn is_empty(&self) -> bool {
        self.project_key.is_none() && self.status.is_empty() && self.priority.is_empty()
    }
}

/// Per-project ticket count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCount {
    pub project: String,
    pub count: i64,
}

/// Result of `get_jira_ticket_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCount {
    pub total_count: i64,
    /// Populated when no project filter was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_breakdown: Option<Vec<ProjectCount>>,
}
