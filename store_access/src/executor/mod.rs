//! Executor operations
//!
//! Every operation resolves its SQL through the query catalog and runs through
//! the shared circuit breaker before touching the pool.

pub mod core;
pub mod cursor;
pub mod fetch;
pub mod transaction;
pub mod write;

pub use self::core::Database;
pub use cursor::Cursor;
pub use transaction::DataTransaction;
