//! AOMA Mesh — MCP server over an enterprise knowledge corpus.
//!
//! Exposes retrieval and analytical tools over two transports (stdio
//! JSON-RPC 2.0 and HTTP) backed by a hosted LLM with an attached document
//! vector store, a Postgres-backed relational+vector database, and a
//! multi-retriever reranking pipeline with LLM synthesis.
//!
//! Layers:
//! - `domain`: models, error taxonomy, upstream ports
//! - `infrastructure`: config, logging, LLM and database clients
//! - `services`: tool registry/dispatch, retrieval, orchestration, swarm,
//!   health, cache, metrics
//! - `adapters`: stdio and HTTP transports

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod server;
pub mod services;

pub use domain::errors::{ToolError, ToolResult};
pub use infrastructure::config::Environment;
pub use server::Server;
