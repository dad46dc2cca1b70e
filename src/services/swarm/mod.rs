//! Swarm controller: a capped agent-hop state machine.
//!
//! Four specialists hand work to each other via Command-style transitions.
//! Transitions are strictly sequential and deterministic for identical
//! inputs; the hop counter bounds the walk, and every agent records its
//! output for the agents after it.

pub mod compression;
pub mod correlation;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::domain::errors::ToolResult;
use crate::domain::models::{ContextStrategy, JiraFilters, SwarmAgent, SwarmState};
use crate::domain::ports::{KnowledgeDb, LanguageModel};
use crate::infrastructure::config::Environment;

use super::analysis::{self, DevContextArgs};
use super::orchestrator;
use super::retrieval::{git, jira};
use compression::{compress, CompressionLevel};

/// Default hop budget.
pub const DEFAULT_MAX_HOPS: u32 = 5;

/// Result caps used by the specialist searches.
const SPECIALIST_MAX_RESULTS: usize = 10;
const SPECIALIST_THRESHOLD: f64 = 0.5;

/// Parsed arguments for `swarm_analyze_cross_vector`.
#[derive(Debug, Clone)]
pub struct SwarmArgs {
    pub query: String,
    pub primary_agent: Option<SwarmAgent>,
    pub context_strategy: ContextStrategy,
    pub max_agent_hops: u32,
    pub enable_memory_persistence: bool,
}

/// What an agent decided to do after executing.
enum Step {
    Handoff(SwarmAgent, &'static str),
    Terminal,
}

/// Drives specialist agents over the shared swarm state.
pub struct SwarmController {
    llm: Arc<dyn LanguageModel>,
    db: Arc<dyn KnowledgeDb>,
    env: Arc<Environment>,
}

impl SwarmController {
    pub fn new(llm: Arc<dyn LanguageModel>, db: Arc<dyn KnowledgeDb>, env: Arc<Environment>) -> Self {
        Self { llm, db, env }
    }

    /// Run the state machine to a terminal agent or the hop limit.
    pub async fn run(&self, args: SwarmArgs) -> ToolResult<Value> {
        let initial = args.primary_agent.unwrap_or(SwarmAgent::SynthesisCoordinator);
        let mut state = SwarmState::new(
            args.query.clone(),
            initial,
            args.max_agent_hops,
            args.context_strategy,
        );
        let mut last_output = Value::Null;

        loop {
            tracing::debug!(agent = %state.active_agent, hops = state.agent_hops, "executing swarm agent");
            let step = match state.active_agent {
                SwarmAgent::CodeSpecialist => self.code_specialist(&mut state, &mut last_output).await?,
                SwarmAgent::JiraAnalyst => self.jira_analyst(&mut state, &mut last_output).await?,
                SwarmAgent::AomaResearcher => self.aoma_researcher(&mut state, &mut last_output).await?,
                SwarmAgent::SynthesisCoordinator => {
                    self.synthesis_coordinator(&mut state, &mut last_output).await?
                }
            };

            match step {
                Step::Terminal => return Ok(self.render(&state, &args, last_output, false)),
                Step::Handoff(to, reason) => {
                    if !state.hand_off(to, reason) {
                        tracing::warn!(max_hops = state.max_hops, "swarm hop limit reached, returning partial result");
                        return Ok(self.render(&state, &args, last_output, true));
                    }
                }
            }
        }
    }

    async fn code_specialist(&self, state: &mut SwarmState, last_output: &mut Value) -> ToolResult<Step> {
        let files = git::search_code(
            self.llm.as_ref(),
            self.db.as_ref(),
            &state.query,
            &git::CodeFilters::default(),
            SPECIALIST_MAX_RESULTS,
            SPECIALIST_THRESHOLD,
        )
        .await?;
        let output = json!({ "agent": SwarmAgent::CodeSpecialist, "files": files });
        state.cross_vector_results.code = Some(output.clone());
        *last_output = output;

        let query = state.query.to_lowercase();
        if query.contains("issue") || query.contains("problem") {
            Ok(Step::Handoff(SwarmAgent::JiraAnalyst, "query references an issue or problem"))
        } else {
            Ok(Step::Terminal)
        }
    }

    async fn jira_analyst(&self, state: &mut SwarmState, last_output: &mut Value) -> ToolResult<Step> {
        let tickets = jira::search_tickets(
            self.llm.as_ref(),
            self.db.as_ref(),
            self.env.jira_base_url.as_deref(),
            &state.query,
            &JiraFilters::default(),
            SPECIALIST_MAX_RESULTS,
            SPECIALIST_THRESHOLD,
        )
        .await?;
        let found = tickets.len();
        let output = json!({ "agent": SwarmAgent::JiraAnalyst, "tickets": tickets });
        state.cross_vector_results.jira = Some(output.clone());
        *last_output = output;

        if found >= 1 && state.cross_vector_results.aoma.is_none() {
            Ok(Step::Handoff(SwarmAgent::AomaResearcher, "tickets found, AOMA context still missing"))
        } else {
            Ok(Step::Terminal)
        }
    }

    async fn aoma_researcher(&self, state: &mut SwarmState, last_output: &mut Value) -> ToolResult<Step> {
        let research = orchestrator::ensemble_query(
            self.llm.as_ref(),
            self.db.as_ref(),
            self.env.vector_store_id.as_deref(),
            &state.query,
            crate::domain::models::QueryStrategy::Comprehensive,
            None,
        )
        .await?;
        state.cross_vector_results.aoma = Some(research.clone());
        *last_output = research;
        Ok(Step::Handoff(SwarmAgent::SynthesisCoordinator, "AOMA research complete"))
    }

    async fn synthesis_coordinator(&self, state: &mut SwarmState, last_output: &mut Value) -> ToolResult<Step> {
        if state.cross_vector_results.populated() == 0 {
            return Ok(Step::Handoff(SwarmAgent::CodeSpecialist, "no cross-vector context yet"));
        }

        state.correlations = correlation::correlate(&state.cross_vector_results);

        let context = self.handoff_context(state, last_output);
        let analysis = analysis::analyze_development_context(
            self.llm.as_ref(),
            &self.env.assistant_id,
            self.env.vector_store_id.iter().cloned().collect(),
            DevContextArgs {
                current_task: format!("Synthesize cross-vector findings for: {}", state.query),
                code_context: Some(context),
                system_area: Some("integration".to_string()),
                urgency: None,
            },
        )
        .await?;

        let synthesis = analysis
            .get("analysis")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        state.final_synthesis = Some(synthesis);
        *last_output = analysis;
        Ok(Step::Terminal)
    }

    /// Context handed to the synthesis prompt, shaped by the strategy:
    /// isolated sees only the latest result, shared sees everything,
    /// selective_handoff sees everything lightly compressed.
    fn handoff_context(&self, state: &SwarmState, last_output: &Value) -> String {
        let full = json!({
            "handoffHistory": state.handoff_history,
            "crossVectorResults": state.cross_vector_results,
            "correlations": state.correlations,
        })
        .to_string();

        match state.context_strategy {
            ContextStrategy::Isolated => last_output.to_string(),
            ContextStrategy::Shared => full,
            ContextStrategy::SelectiveHandoff => compress(&full, CompressionLevel::Light),
        }
    }

    fn render(&self, state: &SwarmState, args: &SwarmArgs, last_output: Value, hop_limit_reached: bool) -> Value {
        let duration_ms = (Utc::now() - state.started_at).num_milliseconds().max(0);
        json!({
            "query": state.query,
            "finalAgent": state.active_agent,
            "agentHops": state.agent_hops,
            "maxHops": state.max_hops,
            "contextStrategy": state.context_strategy,
            "handoffHistory": state.handoff_history,
            "crossVectorResults": state.cross_vector_results,
            "correlations": state.correlations,
            "synthesis": state.final_synthesis,
            "result": last_output,
            "hopLimitReached": hop_limit_reached,
            "memoryPersistence": args.enable_memory_persistence,
            "durationMs": duration_ms,
        })
    }
}
