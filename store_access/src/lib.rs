//! Store Access - resilience-wrapped data access for QueryHaus
//!
//! This crate provides the model contract, the executor operations that run named
//! queries through the shared circuit breaker, the result binder for embedded
//! JSON fields, and relation introspection.

// Lets derive output name `store_access::...` inside this crate's own tests
extern crate self as store_access;

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

pub mod args;
pub mod binder;
pub mod context;
pub mod errors;
pub mod executor;
pub mod prelude;
pub mod relation;
pub mod traits;
pub mod types;

pub use args::{Args, Params};
pub use binder::{bind_all, bind_record, BindReport, EmbeddedField};
pub use context::QueryContext;
pub use errors::DataError;
pub use executor::{Cursor, DataTransaction, Database};
pub use relation::{Association, Related};
pub use traits::*;
pub use types::{FetchList, Filter, Page, Paginate, Relation};

pub use type_mapping::JsonText;

// Used by derive output
pub use serde_json;

#[cfg(test)]
mod tests;
