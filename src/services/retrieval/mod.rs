//! Retrieval pipelines: vector-store fast path, unified table, Jira, git.

pub mod git;
pub mod jira;
pub mod knowledge;
pub mod unified;
