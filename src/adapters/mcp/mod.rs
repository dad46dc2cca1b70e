//! MCP transports: stdio JSON-RPC and HTTP.

pub mod http_server;
pub mod rate_limiter;
pub mod stdio_server;

pub use http_server::{router, serve};
pub use rate_limiter::IpRateLimiter;
pub use stdio_server::StdioServer;
