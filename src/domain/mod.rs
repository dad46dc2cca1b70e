//! Domain layer: models, errors, and upstream ports.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ToolError, ToolResult, Violation};
