//! Knowledge database client: stored procedures and table selects.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DbClientConfig, SupabaseClient};
pub use error::DbApiError;
pub use types::{OrIlike, SelectQuery};
