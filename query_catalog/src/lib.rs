//! Query catalog for named SQL templates
//!
//! This crate resolves logical query names such as `contracts/fetch` to the SQL text
//! stored in `<sql_dir>/contracts/fetch.sql`, caching every template after its first load.

pub mod catalog;
pub mod errors;
pub mod prelude;
pub mod source;

pub use catalog::QueryCatalog;
pub use errors::CatalogError;
pub use source::{DirectorySource, QuerySource};
