//! Shared types for the iPXE distributor
//!
//! This crate contains the error types, query kinds and small helpers shared
//! by the configuration loader, the resolver and the HTTP service.

pub mod error;
pub mod query;
pub mod utils;

// Re-export commonly used types
pub use error::{ConfigError, ConfigResult, LookupError, LookupResult};
pub use query::QueryKind;
