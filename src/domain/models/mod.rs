//! Domain models for the AOMA mesh server.

pub mod document;
pub mod git;
pub mod health;
pub mod jira;
pub mod metrics;
pub mod strategy;
pub mod swarm;

pub use document::{Document, SourceType, VectorHit};
pub use git::{CodeFile, Commit};
pub use health::{HealthStatus, OverallStatus, ServiceHealth};
pub use jira::{JiraFilters, JiraTicket, ProjectCount, TicketCount};
pub use metrics::MetricsSnapshot;
pub use strategy::QueryStrategy;
pub use swarm::{
    ContextStrategy, Correlation, CorrelationRelationship, CorrelationSource, CrossVectorResults,
    HandoffRecord, SwarmAgent, SwarmState,
};
