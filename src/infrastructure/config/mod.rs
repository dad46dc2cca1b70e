//! Environment configuration.
//!
//! The process environment is validated once at startup against a fixed
//! schema; the resulting [`Environment`] is immutable and shared read-only.
//! Validation collects every violation before failing so the operator gets
//! one complete diff instead of a whack-a-mole loop.
//!
//! Loading order, first wins: process env → `.env` beside the manifest →
//! `.env.local` at the project root (found by walking upward for a
//! workspace marker).

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

/// Configuration validation failure: one line per missing/invalid key.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment validation failed:\n{0}")]
    Report(String),
}

/// Log verbosity accepted by the `LOG_LEVEL` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Deployment environment, controls CORS behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployEnv {
    Development,
    Production,
}

/// Validated, immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Environment {
    /// LLM provider API key.
    pub openai_api_key: String,
    /// Assistant id, `asst_` prefixed.
    pub assistant_id: String,
    /// Optional hosted vector store id, `vs_` prefixed.
    pub vector_store_id: Option<String>,
    /// Optional LLM API base URL override.
    pub openai_base_url: Option<String>,
    /// Database REST URL.
    pub supabase_url: String,
    /// Database service key.
    pub supabase_service_key: String,
    /// Database anonymous key.
    pub supabase_anon_key: String,
    /// Jira browse base URL, e.g. `https://jira.example.com`.
    pub jira_base_url: Option<String>,
    /// HTTP listen port.
    pub http_port: u16,
    /// Overall per-tool-call deadline in milliseconds.
    pub timeout_ms: u64,
    /// Upstream retry budget.
    pub max_retries: u32,
    /// Log verbosity.
    pub log_level: LogLevel,
    /// Seconds between background health probes.
    pub health_check_interval_secs: u64,
    /// Deployment environment.
    pub deploy_env: DeployEnv,
    /// CORS allowlist for production, comma separated origins.
    pub cors_allowed_origins: Vec<String>,
    /// Tracing project name, when request tracing is exported.
    pub tracing_project: Option<String>,
    /// Tracing API key.
    pub tracing_api_key: Option<String>,
    /// Tracing collector endpoint.
    pub tracing_endpoint: Option<String>,
    /// Unique per-process build tag: `{base}-{YYYYMMDD-HHMMSS}`.
    pub version: String,
}

const MIN_KEY_LEN: usize = 20;
const MIN_TIMEOUT_MS: u64 = 5_000;
const MAX_TIMEOUT_MS: u64 = 300_000;
const DEFAULT_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_PORT: u16 = 3333;
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 60;

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Environment {
    /// Layer dotenv files under the process environment, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv_files();
        Self::from_process_env()
    }

    /// Validate the current process environment without touching dotenv
    /// files. Collects every violation into a single report.
    pub fn from_process_env() -> Result<Self, ConfigError> {
        let mut violations: Vec<String> = Vec::new();
        let mut require = |name: &'static str, min_len: usize| -> String {
            match var(name) {
                Some(v) if v.len() >= min_len => v,
                Some(v) => {
                    violations.push(format!("  {name}: too short ({} chars, need >= {min_len})", v.len()));
                    v
                }
                None => {
                    violations.push(format!("  {name}: missing"));
                    String::new()
                }
            }
        };

        let openai_api_key = require("OPENAI_API_KEY", MIN_KEY_LEN);
        let assistant_id = require("AOMA_ASSISTANT_ID", 1);
        let supabase_url = require("SUPABASE_URL", 1);
        let supabase_service_key = require("SUPABASE_SERVICE_ROLE_KEY", MIN_KEY_LEN);
        let supabase_anon_key = require("SUPABASE_ANON_KEY", MIN_KEY_LEN);

        if !assistant_id.is_empty() && !assistant_id.starts_with("asst_") {
            violations.push("  AOMA_ASSISTANT_ID: must start with 'asst_'".to_string());
        }
        if !supabase_url.is_empty() && !supabase_url.starts_with("http") {
            violations.push("  SUPABASE_URL: must be an http(s) URL".to_string());
        }

        let vector_store_id = var("OPENAI_VECTOR_STORE_ID");
        if let Some(id) = &vector_store_id {
            if !id.starts_with("vs_") {
                violations.push("  OPENAI_VECTOR_STORE_ID: must start with 'vs_'".to_string());
            }
        }

        let timeout_ms = match var("TIMEOUT_MS").map(|v| v.parse::<u64>()) {
            None => DEFAULT_TIMEOUT_MS,
            Some(Ok(ms)) if (MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&ms) => ms,
            Some(Ok(ms)) => {
                violations.push(format!("  TIMEOUT_MS: {ms} out of range [{MIN_TIMEOUT_MS}, {MAX_TIMEOUT_MS}]"));
                DEFAULT_TIMEOUT_MS
            }
            Some(Err(_)) => {
                violations.push("  TIMEOUT_MS: not a number".to_string());
                DEFAULT_TIMEOUT_MS
            }
        };

        let max_retries = match var("MAX_RETRIES").map(|v| v.parse::<u32>()) {
            None => 3,
            Some(Ok(n)) if (1..=10).contains(&n) => n,
            Some(Ok(n)) => {
                violations.push(format!("  MAX_RETRIES: {n} out of range [1, 10]"));
                3
            }
            Some(Err(_)) => {
                violations.push("  MAX_RETRIES: not a number".to_string());
                3
            }
        };

        let http_port = match var("MCP_SERVER_PORT").map(|v| v.parse::<u16>()) {
            None => DEFAULT_PORT,
            Some(Ok(p)) => p,
            Some(Err(_)) => {
                violations.push("  MCP_SERVER_PORT: not a valid port".to_string());
                DEFAULT_PORT
            }
        };

        let log_level = match var("LOG_LEVEL") {
            None => LogLevel::Info,
            Some(v) => LogLevel::parse(&v).unwrap_or_else(|| {
                violations.push(format!("  LOG_LEVEL: '{v}' not one of error|warn|info|debug"));
                LogLevel::Info
            }),
        };

        let health_check_interval_secs = match var("HEALTH_CHECK_INTERVAL").map(|v| v.parse::<u64>()) {
            None => DEFAULT_HEALTH_INTERVAL_SECS,
            Some(Ok(n)) if n > 0 => n,
            Some(_) => {
                violations.push("  HEALTH_CHECK_INTERVAL: must be a positive number of seconds".to_string());
                DEFAULT_HEALTH_INTERVAL_SECS
            }
        };

        let deploy_env = match var("NODE_ENV").or_else(|| var("ENVIRONMENT")).as_deref() {
            Some("production") => DeployEnv::Production,
            _ => DeployEnv::Development,
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect())
            .unwrap_or_default();

        if !violations.is_empty() {
            return Err(ConfigError::Report(violations.join("\n")));
        }

        let base_version = var("MCP_SERVER_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        Ok(Self {
            openai_api_key,
            assistant_id,
            vector_store_id,
            openai_base_url: var("OPENAI_BASE_URL"),
            supabase_url,
            supabase_service_key,
            supabase_anon_key,
            jira_base_url: var("JIRA_BASE_URL"),
            http_port,
            timeout_ms,
            max_retries,
            log_level,
            health_check_interval_secs,
            deploy_env,
            cors_allowed_origins,
            tracing_project: var("LANGSMITH_PROJECT"),
            tracing_api_key: var("LANGSMITH_API_KEY"),
            tracing_endpoint: var("LANGSMITH_ENDPOINT"),
            version: build_tag(&base_version),
        })
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.deploy_env == DeployEnv::Production
    }

    /// Non-secret subset exposed via the `aoma://config` resource.
    pub fn public_view(&self) -> serde_json::Value {
        serde_json::json!({
            "version": self.version,
            "httpPort": self.http_port,
            "timeoutMs": self.timeout_ms,
            "maxRetries": self.max_retries,
            "logLevel": self.log_level.as_str(),
            "healthCheckIntervalSecs": self.health_check_interval_secs,
            "environment": if self.is_production() { "production" } else { "development" },
            "vectorStoreConfigured": self.vector_store_id.is_some(),
            "jiraBaseUrl": self.jira_base_url,
            "tracingProject": self.tracing_project,
        })
    }
}

/// Append a `YYYYMMDD-HHMMSS` timestamp so each process gets a unique tag.
fn build_tag(base: &str) -> String {
    format!("{base}-{}", Utc::now().format("%Y%m%d-%H%M%S"))
}

/// Load `.env` beside the manifest, then `.env.local` at the project root.
/// dotenvy never overrides variables that are already set, which gives the
/// required precedence for free.
fn load_dotenv_files() {
    let _ = dotenvy::from_path(Path::new(".env"));
    if let Some(root) = find_workspace_root() {
        let _ = dotenvy::from_path(root.join(".env.local"));
    }
}

/// Walk upward from the current directory looking for a workspace marker.
fn find_workspace_root() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        if dir.join("Cargo.lock").exists() || dir.join(".git").exists() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}
