//! Canonical tool set: declarative specs plus handler bindings.
//!
//! Every tool is data first — name, description, argument schema — so the
//! same specs drive registration, `tools/list`, the capabilities tool, and
//! the generated manual. Handlers are pure functions of (arguments,
//! context).

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::errors::{ToolError, ToolResult};
use crate::domain::models::{ContextStrategy, JiraFilters, QueryStrategy, SwarmAgent};
use crate::domain::ports::{KnowledgeDb, LanguageModel};
use crate::infrastructure::config::Environment;

use super::analysis::{self, DevContextArgs};
use super::cache::ToolCache;
use super::health::HealthService;
use super::metrics::MetricsRegistry;
use super::orchestrator;
use super::registry::{ToolDescriptor, ToolHandler, ToolRegistry};
use super::retrieval::{git, jira, knowledge};
use super::swarm::{SwarmArgs, SwarmController, DEFAULT_MAX_HOPS};
use super::validation::ArgumentSchema;

/// Shared dependencies handed to every handler.
pub struct ServerContext {
    pub env: Arc<Environment>,
    pub llm: Arc<dyn LanguageModel>,
    pub db: Arc<dyn KnowledgeDb>,
    pub metrics: Arc<MetricsRegistry>,
    pub cache: Arc<ToolCache>,
    pub health: Arc<HealthService>,
}

/// A tool's declarative spec.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Value,
    pub cache_ttl: Option<Duration>,
}

/// The canonical tool set, in listing order.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "query_aoma_knowledge",
            description: "Answer a question from the AOMA knowledge corpus with source citations. \
                          Strategy controls retrieval depth and response budget.",
            schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "minLength": 1, "description": "The question to answer" },
                    "strategy": { "type": "string", "enum": ["comprehensive", "focused", "rapid"], "description": "Retrieval depth. Default: focused." },
                    "context": { "type": "string", "description": "Additional caller context woven into the prompt" },
                    "maxResults": { "type": "integer", "minimum": 1, "maximum": 20, "description": "Candidate documents to retrieve (default: 10)" }
                },
                "required": ["query"]
            }),
            cache_ttl: None,
        },
        ToolSpec {
            name: "search_jira_tickets",
            description: "Semantic search over Jira tickets with a text fallback. Filters by \
                          project, status, and priority.",
            schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "minLength": 1 },
                    "projectKey": { "type": "string" },
                    "status": { "type": "array", "items": { "type": "string" } },
                    "priority": { "type": "array", "items": { "type": "string" } },
                    "maxResults": { "type": "integer", "minimum": 1, "maximum": 50 },
                    "threshold": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
                },
                "required": ["query"]
            }),
            cache_ttl: None,
        },
        ToolSpec {
            name: "get_jira_ticket_count",
            description: "Exact ticket counts via stored procedure, with a per-project breakdown \
                          when no project filter is supplied.",
            schema: json!({
                "type": "object",
                "properties": {
                    "projectKey": { "type": "string" },
                    "status": { "type": "array", "items": { "type": "string" } },
                    "priority": { "type": "array", "items": { "type": "string" } }
                }
            }),
            cache_ttl: None,
        },
        ToolSpec {
            name: "search_git_commits",
            description: "Semantic search over git commit history, filtered by repository, \
                          author, date range, or touched file pattern.",
            schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "minLength": 1 },
                    "repository": { "type": "array", "items": { "type": "string" } },
                    "author": { "type": "array", "items": { "type": "string" } },
                    "dateFrom": { "type": "string" },
                    "dateTo": { "type": "string" },
                    "filePattern": { "type": "string" },
                    "maxResults": { "type": "integer", "minimum": 1, "maximum": 50 },
                    "threshold": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
                },
                "required": ["query"]
            }),
            cache_ttl: None,
        },
        ToolSpec {
            name: "search_code_files",
            description: "Semantic search over indexed code files, filtered by repository, \
                          language, or extension.",
            schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "minLength": 1 },
                    "repository": { "type": "array", "items": { "type": "string" } },
                    "language": { "type": "array", "items": { "type": "string" } },
                    "fileExtension": { "type": "array", "items": { "type": "string" } },
                    "maxResults": { "type": "integer", "minimum": 1, "maximum": 50 },
                    "threshold": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
                },
                "required": ["query"]
            }),
            cache_ttl: None,
        },
        ToolSpec {
            name: "analyze_development_context",
            description: "Assess a development task against AOMA operational knowledge: blast \
                          radius, prior incidents, risks, next steps.",
            schema: json!({
                "type": "object",
                "properties": {
                    "currentTask": { "type": "string", "minLength": 1 },
                    "codeContext": { "type": "string" },
                    "systemArea": { "type": "string", "enum": ["frontend", "backend", "database", "infrastructure", "integration", "testing"] },
                    "urgency": { "type": "string", "enum": ["low", "medium", "high", "critical"] }
                },
                "required": ["currentTask"]
            }),
            cache_ttl: None,
        },
        ToolSpec {
            name: "get_system_health",
            description: "Current health of the LLM, database, and vector store upstreams, with \
                          request metrics.",
            schema: json!({
                "type": "object",
                "properties": {
                    "includeMetrics": { "type": "boolean" },
                    "includeDiagnostics": { "type": "boolean" }
                }
            }),
            cache_ttl: Some(Duration::from_secs(10)),
        },
        ToolSpec {
            name: "get_server_capabilities",
            description: "Server metadata: registered tools, resources, endpoints, and transport \
                          capabilities.",
            schema: json!({
                "type": "object",
                "properties": {
                    "includeExamples": { "type": "boolean" }
                }
            }),
            cache_ttl: Some(Duration::from_secs(300)),
        },
        ToolSpec {
            name: "swarm_analyze_cross_vector",
            description: "Multi-agent cross-vector analysis: specialist agents hand off across \
                          code, Jira, and AOMA knowledge, then synthesize with correlations.",
            schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "minLength": 1 },
                    "primaryAgent": { "type": "string", "enum": ["code_specialist", "jira_analyst", "aoma_researcher", "synthesis_coordinator"] },
                    "contextStrategy": { "type": "string", "enum": ["isolated", "shared", "selective_handoff"] },
                    "maxAgentHops": { "type": "integer", "minimum": 1, "maximum": 10 },
                    "enableMemoryPersistence": { "type": "boolean" }
                },
                "required": ["query"]
            }),
            cache_ttl: None,
        },
    ]
}

/// Build the registry: every spec bound to its handler.
pub fn build_registry(ctx: &Arc<ServerContext>) -> ToolResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for spec in tool_specs() {
        let handler = handler_for(spec.name, ctx)?;
        registry.register(ToolDescriptor {
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            schema: ArgumentSchema::new(spec.schema)?,
            handler,
            cache_ttl: spec.cache_ttl,
        });
    }
    Ok(registry)
}

macro_rules! bind {
    ($ctx:ident, $handler:path) => {{
        let ctx = Arc::clone($ctx);
        let handler: ToolHandler = Arc::new(move |args| {
            let ctx = Arc::clone(&ctx);
            Box::pin(async move { $handler(ctx, args).await })
        });
        handler
    }};
}

fn handler_for(name: &str, ctx: &Arc<ServerContext>) -> ToolResult<ToolHandler> {
    let handler = match name {
        "query_aoma_knowledge" => bind!(ctx, query_aoma_knowledge),
        "search_jira_tickets" => bind!(ctx, search_jira_tickets),
        "get_jira_ticket_count" => bind!(ctx, get_jira_ticket_count),
        "search_git_commits" => bind!(ctx, search_git_commits),
        "search_code_files" => bind!(ctx, search_code_files),
        "analyze_development_context" => bind!(ctx, analyze_development_context),
        "get_system_health" => bind!(ctx, get_system_health),
        "get_server_capabilities" => bind!(ctx, get_server_capabilities),
        "swarm_analyze_cross_vector" => bind!(ctx, swarm_analyze_cross_vector),
        other => return Err(ToolError::Internal(format!("no handler for tool: {other}"))),
    };
    Ok(handler)
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::Internal(format!("argument shape mismatch after validation: {e}")))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeArgs {
    query: String,
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    max_results: Option<usize>,
}

async fn query_aoma_knowledge(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: KnowledgeArgs = parse_args(args)?;
    let strategy = args
        .strategy
        .as_deref()
        .and_then(QueryStrategy::parse)
        .unwrap_or_default();
    let max_results = args.max_results.unwrap_or(10);

    match strategy {
        QueryStrategy::Comprehensive => {
            orchestrator::ensemble_query(
                ctx.llm.as_ref(),
                ctx.db.as_ref(),
                ctx.env.vector_store_id.as_deref(),
                &args.query,
                strategy,
                args.context.as_deref(),
            )
            .await
        }
        _ => match ctx.env.vector_store_id.as_deref() {
            Some(store_id) => {
                knowledge::fast_query(
                    ctx.llm.as_ref(),
                    store_id,
                    &args.query,
                    strategy,
                    args.context.as_deref(),
                    max_results,
                )
                .await
            }
            None => {
                knowledge::assistant_query(
                    ctx.llm.as_ref(),
                    &ctx.env.assistant_id,
                    &args.query,
                    strategy,
                    args.context.as_deref(),
                )
                .await
            }
        },
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraSearchArgs {
    query: String,
    #[serde(default)]
    project_key: Option<String>,
    #[serde(default)]
    status: Vec<String>,
    #[serde(default)]
    priority: Vec<String>,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    threshold: Option<f64>,
}

async fn search_jira_tickets(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: JiraSearchArgs = parse_args(args)?;
    let filters = JiraFilters {
        project_key: args.project_key,
        status: args.status,
        priority: args.priority,
    };
    let tickets = jira::search_tickets(
        ctx.llm.as_ref(),
        ctx.db.as_ref(),
        ctx.env.jira_base_url.as_deref(),
        &args.query,
        &filters,
        args.max_results.unwrap_or(15),
        args.threshold.unwrap_or(0.6),
    )
    .await?;
    let count = tickets.len();
    Ok(json!({ "tickets": tickets, "count": count, "query": args.query }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraCountArgs {
    #[serde(default)]
    project_key: Option<String>,
    #[serde(default)]
    status: Vec<String>,
    #[serde(default)]
    priority: Vec<String>,
}

async fn get_jira_ticket_count(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: JiraCountArgs = parse_args(args)?;
    let filters = JiraFilters {
        project_key: args.project_key,
        status: args.status,
        priority: args.priority,
    };
    let count = jira::ticket_count(ctx.db.as_ref(), &filters).await?;
    Ok(serde_json::to_value(count)?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitSearchArgs {
    query: String,
    #[serde(default)]
    repository: Vec<String>,
    #[serde(default)]
    author: Vec<String>,
    #[serde(default)]
    date_from: Option<String>,
    #[serde(default)]
    date_to: Option<String>,
    #[serde(default)]
    file_pattern: Option<String>,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    threshold: Option<f64>,
}

async fn search_git_commits(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: CommitSearchArgs = parse_args(args)?;
    let filters = git::CommitFilters {
        repository: args.repository,
        author: args.author,
        date_from: args.date_from,
        date_to: args.date_to,
        file_pattern: args.file_pattern,
    };
    let commits = git::search_commits(
        ctx.llm.as_ref(),
        ctx.db.as_ref(),
        &args.query,
        &filters,
        args.max_results.unwrap_or(15),
        args.threshold.unwrap_or(0.6),
    )
    .await?;
    let count = commits.len();
    Ok(json!({ "commits": commits, "count": count, "query": args.query }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeSearchArgs {
    query: String,
    #[serde(default)]
    repository: Vec<String>,
    #[serde(default)]
    language: Vec<String>,
    #[serde(default)]
    file_extension: Vec<String>,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    threshold: Option<f64>,
}

async fn search_code_files(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: CodeSearchArgs = parse_args(args)?;
    let filters = git::CodeFilters {
        repository: args.repository,
        language: args.language,
        file_extension: args.file_extension,
    };
    let files = git::search_code(
        ctx.llm.as_ref(),
        ctx.db.as_ref(),
        &args.query,
        &filters,
        args.max_results.unwrap_or(15),
        args.threshold.unwrap_or(0.6),
    )
    .await?;
    let count = files.len();
    Ok(json!({ "files": files, "count": count, "query": args.query }))
}

async fn analyze_development_context(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: DevContextArgs = parse_args(args)?;
    analysis::analyze_development_context(
        ctx.llm.as_ref(),
        &ctx.env.assistant_id,
        ctx.env.vector_store_id.iter().cloned().collect(),
        args,
    )
    .await
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthArgs {
    #[serde(default)]
    include_metrics: Option<bool>,
    #[serde(default)]
    include_diagnostics: Option<bool>,
}

async fn get_system_health(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: HealthArgs = parse_args(args)?;
    let status = ctx.health.status().await;
    let mut body = serde_json::to_value(&status)?;

    if !args.include_metrics.unwrap_or(true) {
        if let Some(object) = body.as_object_mut() {
            object.remove("metrics");
        }
    }
    if args.include_diagnostics.unwrap_or(false) {
        body["diagnostics"] = json!({
            "cacheEntries": ctx.cache.len(),
            "config": ctx.env.public_view(),
        });
    }
    Ok(body)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapabilitiesArgs {
    #[serde(default)]
    include_examples: Option<bool>,
}

async fn get_server_capabilities(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: CapabilitiesArgs = parse_args(args)?;
    Ok(capabilities_document(&ctx.env, args.include_examples.unwrap_or(false)))
}

/// The capabilities document is derived from the static tool specs, so
/// two consecutive calls are byte-identical.
pub fn capabilities_document(env: &Environment, include_examples: bool) -> Value {
    let tools: Vec<Value> = tool_specs()
        .iter()
        .map(|spec| {
            let mut entry = json!({
                "name": spec.name,
                "description": spec.description,
                "inputSchema": spec.schema,
            });
            if include_examples {
                entry["example"] = example_for(spec.name);
            }
            entry
        })
        .collect();

    json!({
        "name": "aoma-mesh",
        "version": env.version,
        "description": "MCP server exposing retrieval and analysis tools over the AOMA knowledge corpus",
        "tools": tools,
        "resources": crate::services::resources::resource_listing(),
        "endpoints": {
            "health": "/health",
            "metrics": "/metrics",
            "rpc": "/rpc",
            "tools": "/tools/{name}",
            "discovery": "/.well-known/mcp",
            "registry": "/registry",
        },
        "capabilities": {
            "tools": true,
            "resources": true,
            "transports": ["stdio", "http"],
        },
    })
}

fn example_for(tool: &str) -> Value {
    match tool {
        "query_aoma_knowledge" => json!({ "query": "How does the export pipeline recover from failures?", "strategy": "focused" }),
        "search_jira_tickets" => json!({ "query": "login timeout", "projectKey": "ITSM", "maxResults": 10 }),
        "get_jira_ticket_count" => json!({ "status": ["Open"] }),
        "search_git_commits" => json!({ "query": "token refresh fix", "maxResults": 5 }),
        "search_code_files" => json!({ "query": "session validation", "language": ["rust"] }),
        "analyze_development_context" => json!({ "currentTask": "Migrate session store", "systemArea": "backend", "urgency": "high" }),
        "get_system_health" => json!({ "includeMetrics": true }),
        "get_server_capabilities" => json!({ "includeExamples": false }),
        "swarm_analyze_cross_vector" => json!({ "query": "authentication service performance problem" }),
        _ => json!({}),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwarmToolArgs {
    query: String,
    #[serde(default)]
    primary_agent: Option<String>,
    #[serde(default)]
    context_strategy: Option<String>,
    #[serde(default)]
    max_agent_hops: Option<u32>,
    #[serde(default)]
    enable_memory_persistence: Option<bool>,
}

async fn swarm_analyze_cross_vector(ctx: Arc<ServerContext>, args: Value) -> ToolResult<Value> {
    let args: SwarmToolArgs = parse_args(args)?;
    let primary_agent = match args.primary_agent.as_deref() {
        Some(name) => Some(
            SwarmAgent::parse(name)
                .ok_or_else(|| ToolError::invalid_params("/primaryAgent", format!("unknown agent: {name}")))?,
        ),
        None => None,
    };
    let context_strategy = args
        .context_strategy
        .as_deref()
        .and_then(ContextStrategy::parse)
        .unwrap_or_default();

    let controller = SwarmController::new(Arc::clone(&ctx.llm), Arc::clone(&ctx.db), Arc::clone(&ctx.env));
    controller
        .run(SwarmArgs {
            query: args.query,
            primary_agent,
            context_strategy,
            max_agent_hops: args.max_agent_hops.unwrap_or(DEFAULT_MAX_HOPS),
            enable_memory_persistence: args.enable_memory_persistence.unwrap_or(false),
        })
        .await
}
