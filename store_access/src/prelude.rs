//! Convenience re-exports for common store-access usage

// Core traits
pub use crate::traits::{Embedded, FetchKey, FetchTarget, Model, Record};
pub use crate::relation::{Association, Related};

// Error types
pub use crate::errors::DataError;

// Executor
pub use crate::args;
pub use crate::args::{Args, Params};
pub use crate::context::QueryContext;
pub use crate::executor::{Cursor, DataTransaction, Database};

// Value types
pub use crate::types::{FetchList, Filter, Page, Paginate, Relation};
pub use type_mapping::JsonText;

// Common external dependencies that are frequently used
pub use serde::{Deserialize, Serialize};
pub use sqlx::{FromRow, PgPool, Row};
pub use uuid::Uuid;
