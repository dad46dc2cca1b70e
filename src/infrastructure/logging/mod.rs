//! Logging setup.
//!
//! All log output goes to stderr: stdout is reserved for the stdio MCP
//! protocol. The filter defaults to the configured level but can be
//! overridden with `RUST_LOG`.

pub mod secret_scrubbing;

pub use secret_scrubbing::SecretScrubber;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::LogLevel;

/// Initialize tracing for the server process.
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("aoma_mesh={}", level.as_str())));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .init();
}
