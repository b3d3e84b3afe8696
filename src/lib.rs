//! # QueryHaus
//!
//! Resilience-wrapped PostgreSQL data access. Every query is a named SQL file,
//! every call runs through one shared circuit breaker, and JSON columns produced by
//! views are bound into typed fields of the fetched records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use queryhaus::prelude::*;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! pub struct Owner {
//!     pub name: String,
//! }
//!
//! #[model]
//! #[table(name = "contracts")]
//! pub struct Contract {
//!     pub id: Uuid,
//!     pub title: String,
//!
//!     #[sqlx(rename = "owner")]
//!     #[serde(skip)]
//!     pub owner_json: Option<JsonText>,
//!
//!     #[sqlx(skip)]
//!     pub owner: Option<Owner>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let haus = QueryHaus::from_config(&config).await?;
//!
//!     // Runs sql/contracts/fetch.sql with the key array as $1
//!     let ctx = QueryContext::with_timeout(std::time::Duration::from_secs(5));
//!     let contract: Contract = haus.fetch(&ctx, &[Uuid::new_v4()]).await?;
//!     println!("{} owned by {:?}", contract.title, contract.owner);
//!
//!     haus.close().await;
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod bootstrap;
pub mod core;
pub mod errors;
pub mod prelude;

pub use crate::core::{ConnectOptions, QueryHaus};
pub use crate::errors::QueryHausError;
pub use config::{AppConfig, BreakerConfig, DatabaseConfig};

// Re-export the member crates
pub use circuit_breaker;
pub use model_derive;
pub use query_catalog;
pub use store_access;
pub use type_mapping;

pub use sqlx;
