//! Convenience re-exports for common query-catalog usage

pub use crate::catalog::QueryCatalog;
pub use crate::errors::CatalogError;
pub use crate::source::{DirectorySource, QuerySource};
