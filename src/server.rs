//! Server wiring: clients, services, dispatcher, resources.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::ToolResult;
use crate::domain::ports::{KnowledgeDb, LanguageModel};
use crate::infrastructure::config::Environment;
use crate::infrastructure::db::{DbClientConfig, SupabaseClient};
use crate::infrastructure::llm::{LlmClientConfig, OpenAiClient};
use crate::services::{
    tools, Dispatcher, HealthService, MetricsRegistry, ResourceCatalog, ServerContext, ToolCache,
};

/// The assembled server: owns clients, caches, and metrics; tool handlers
/// borrow through the shared context.
pub struct Server {
    pub ctx: Arc<ServerContext>,
    pub dispatcher: Arc<Dispatcher>,
    pub resources: Arc<ResourceCatalog>,
}

impl Server {
    /// Wire the server around already-built upstream clients. Tests hand
    /// in fakes here; production goes through [`Server::from_environment`].
    pub fn with_clients(
        env: Environment,
        llm: Arc<dyn LanguageModel>,
        db: Arc<dyn KnowledgeDb>,
    ) -> ToolResult<Self> {
        let env = Arc::new(env);
        let metrics = Arc::new(MetricsRegistry::new(env.version.clone()));
        let cache = Arc::new(ToolCache::new());
        let health = Arc::new(HealthService::new(
            Arc::clone(&llm),
            Arc::clone(&db),
            env.vector_store_id.clone(),
            Arc::clone(&metrics),
            Duration::from_secs(env.health_check_interval_secs),
        ));
        let ctx = Arc::new(ServerContext {
            env: Arc::clone(&env),
            llm,
            db,
            metrics: Arc::clone(&metrics),
            cache: Arc::clone(&cache),
            health,
        });
        let registry = tools::build_registry(&ctx)?;
        let dispatcher = Arc::new(Dispatcher::new(registry, metrics, cache, env.timeout()));
        let resources = Arc::new(ResourceCatalog::new(Arc::clone(&ctx)));
        Ok(Self { ctx, dispatcher, resources })
    }

    /// Build production clients from the validated environment.
    pub fn from_environment(env: Environment) -> anyhow::Result<Self> {
        let llm = Arc::new(OpenAiClient::new(LlmClientConfig::from_environment(&env))?);
        let db = Arc::new(SupabaseClient::new(DbClientConfig::from_environment(&env))?);
        Ok(Self::with_clients(env, llm, db)?)
    }
}
