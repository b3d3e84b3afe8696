//! Model capability contract
//!
//! These traits should be derived using the `#[model]` attribute macro, which
//! adds row scanning and the embedded field table along with them.
//!
//! ```ignore
//! use queryhaus::prelude::*;
//!
//! #[model]
//! #[table(name = "contracts", fetch = "contracts/fetch")]
//! pub struct Contract {
//!     pub id: Uuid,
//!     pub title: String,
//!
//!     #[sqlx(rename = "owner")]
//!     #[serde(skip)]
//!     pub owner_json: Option<JsonText>,
//!
//!     #[sqlx(skip)]
//!     pub owner: Option<User>,
//! }
//! ```

use crate::binder::EmbeddedField;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

/// A record type backed by a table and a named fetch query
pub trait Model: Send + Sync + Sized {
    /// The table name in the database
    fn table_name() -> &'static str;

    /// Logical name of the query selecting records by an array of keys
    fn fetch_query() -> &'static str;

    /// Persisted column names, in declaration order
    fn columns() -> &'static [&'static str] {
        &[]
    }
}

/// Embedded JSON fields to materialize after a record is scanned
pub trait Embedded: Sized + 'static {
    fn embedded_fields() -> &'static [EmbeddedField<Self>] {
        &[]
    }
}

/// Everything `fetch` needs from a destination element
pub trait Record: Model + Embedded + for<'r> FromRow<'r, PgRow> + Send + Unpin {}

impl<T> Record for T where T: Model + Embedded + for<'r> FromRow<'r, PgRow> + Send + Unpin {}
