//! Swarm controller state: agents, handoffs, and cross-vector correlations.
//!
//! A `SwarmState` lives for exactly one `swarm_analyze_cross_vector` call.
//! Transitions between agents are strictly sequential and bounded by
//! `max_hops`; every agent records its output so later agents can build on
//! accumulated context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Specialist agents the swarm controller can activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwarmAgent {
    CodeSpecialist,
    JiraAnalyst,
    AomaResearcher,
    SynthesisCoordinator,
}

impl SwarmAgent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CodeSpecialist => "code_specialist",
            Self::JiraAnalyst => "jira_analyst",
            Self::AomaResearcher => "aoma_researcher",
            Self::SynthesisCoordinator => "synthesis_coordinator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "code_specialist" => Some(Self::CodeSpecialist),
            "jira_analyst" => Some(Self::JiraAnalyst),
            "aoma_researcher" => Some(Self::AomaResearcher),
            "synthesis_coordinator" => Some(Self::SynthesisCoordinator),
            _ => None,
        }
    }
}

impl std::fmt::Display for SwarmAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much accumulated context is passed across handoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStrategy {
    /// Each agent sees only its own results.
    Isolated,
    /// Full context travels with every handoff.
    Shared,
    /// Context travels compressed; the receiver treats it as lossy.
    SelectiveHandoff,
}

impl Default for ContextStrategy {
    fn default() -> Self {
        Self::Shared
    }
}

impl ContextStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "isolated" => Some(Self::Isolated),
            "shared" => Some(Self::Shared),
            "selective_handoff" => Some(Self::SelectiveHandoff),
            _ => None,
        }
    }
}

/// One recorded transition in the handoff history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffRecord {
    pub from: SwarmAgent,
    pub to: SwarmAgent,
    pub reason: String,
    pub hop: u32,
}

/// Which result set a correlation endpoint refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationSource {
    Code,
    Jira,
    Aoma,
}

/// Interpretation of a cross-source correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationRelationship {
    RelatedIssue,
    Implementation,
    Documentation,
    HistoricalContext,
}

/// Term-level Jaccard similarity between two sources' result sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    pub source_type: CorrelationSource,
    pub target_type: CorrelationSource,
    /// Jaccard similarity in [0, 1].
    pub similarity: f64,
    /// Terms shared by both sides.
    pub key_terms: Vec<String>,
    pub relationship: CorrelationRelationship,
}

/// Raw results each specialist recorded for later agents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossVectorResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aoma: Option<Value>,
}

impl CrossVectorResults {
    /// Number of populated sources.
    pub fn populated(&self) -> usize {
        [self.code.is_some(), self.jira.is_some(), self.aoma.is_some()]
            .iter()
            .filter(|b| **b)
            .count()
    }
}

/// Per-call swarm state, discarded on return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwarmState {
    pub query: String,
    pub active_agent: SwarmAgent,
    pub agent_hops: u32,
    pub max_hops: u32,
    pub context_strategy: ContextStrategy,
    pub handoff_history: Vec<HandoffRecord>,
    pub cross_vector_results: CrossVectorResults,
    pub correlations: Vec<Correlation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_synthesis: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl SwarmState {
    pub fn new(query: String, initial_agent: SwarmAgent, max_hops: u32, context_strategy: ContextStrategy) -> Self {
        Self {
            query,
            active_agent: initial_agent,
            agent_hops: 0,
            max_hops,
            context_strategy,
            handoff_history: Vec::new(),
            cross_vector_results: CrossVectorResults::default(),
            correlations: Vec::new(),
            final_synthesis: None,
            started_at: Utc::now(),
        }
    }

    /// Record a handoff and activate the target agent. Returns `false` when
    /// the hop budget is exhausted and the transition was refused.
    pub fn hand_off(&mut self, to: SwarmAgent, reason: impl Into<String>) -> bool {
        if self.agent_hops >= self.max_hops {
            return false;
        }
        self.agent_hops += 1;
        self.handoff_history.push(HandoffRecord {
            from: self.active_agent,
            to,
            reason: reason.into(),
            hop: self.agent_hops,
        });
        self.active_agent = to;
        true
    }

    /// Whether the given agent has already been activated during this call.
    pub fn has_visited(&self, agent: SwarmAgent) -> bool {
        self.active_agent == agent
            || self
                .handoff_history
                .iter()
                .any(|h| h.from == agent || h.to == agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_off_respects_max_hops() {
        let mut state = SwarmState::new("q".into(), SwarmAgent::SynthesisCoordinator, 2, ContextStrategy::Shared);
        assert!(state.hand_off(SwarmAgent::CodeSpecialist, "start"));
        assert!(state.hand_off(SwarmAgent::JiraAnalyst, "issue terms"));
        assert!(!state.hand_off(SwarmAgent::AomaResearcher, "over budget"));
        assert_eq!(state.agent_hops, 2);
        assert_eq!(state.active_agent, SwarmAgent::JiraAnalyst);
    }

    #[test]
    fn test_handoff_history_records_hop_numbers() {
        let mut state = SwarmState::new("q".into(), SwarmAgent::SynthesisCoordinator, 5, ContextStrategy::Shared);
        state.hand_off(SwarmAgent::CodeSpecialist, "a");
        state.hand_off(SwarmAgent::JiraAnalyst, "b");
        let hops: Vec<u32> = state.handoff_history.iter().map(|h| h.hop).collect();
        assert_eq!(hops, vec![1, 2]);
    }

    #[test]
    fn test_has_visited() {
        let mut state = SwarmState::new("q".into(), SwarmAgent::SynthesisCoordinator, 5, ContextStrategy::Shared);
        assert!(state.has_visited(SwarmAgent::SynthesisCoordinator));
        assert!(!state.has_visited(SwarmAgent::JiraAnalyst));
        state.hand_off(SwarmAgent::JiraAnalyst, "x");
        assert!(state.has_visited(SwarmAgent::JiraAnalyst));
    }

    #[test]
    fn test_agent_parse_rejects_unknown() {
        assert_eq!(SwarmAgent::parse("visual_agent"), None);
    }
}
