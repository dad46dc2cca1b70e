//! Transport adapters.

pub mod mcp;
