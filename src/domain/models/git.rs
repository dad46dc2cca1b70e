//! Git commit and code file result shapes.

use serde::{Deserialize, Serialize};

/// A commit returned by `search_git_commits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub hash: String,
    pub message: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub files_changed: Option<i64>,
    #[serde(default)]
    pub additions: Option<i64>,
    #[serde(default)]
    pub deletions: Option<i64>,
    #[serde(default)]
    pub diff_summary: Option<String>,
    pub similarity: f64,
}

/// A code file returned by `search_code_files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFile {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub line_count: Option<i64>,
    #[serde(default)]
    pub last_modified: Option<String>,
    pub similarity: f64,
}
