//! Convenience re-exports for common QueryHaus usage
//!
//! This prelude module re-exports the most commonly used items from the QueryHaus crates,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use queryhaus::prelude::*;
//!
//! let ctx = QueryContext::background();
//! assert!(ctx.deadline().is_none());
//! ```

// Core QueryHaus components
pub use crate::bootstrap;
pub use crate::core::{ConnectOptions, QueryHaus};
pub use crate::errors::QueryHausError;

// Re-export centralized config
pub use config::{AppConfig, BreakerConfig, DatabaseConfig};

// Data access: traits, executor, value types
pub use store_access::prelude::*;

// Re-export store_access for macro-generated code
pub use store_access;

// Model derive
pub use model_derive::{Model, model};

// Breaker state and events
pub use circuit_breaker::prelude::*;

// Query catalog
pub use query_catalog::prelude::*;

// Common external dependencies
pub use anyhow;
pub use sqlx;
pub use tokio;
