//! Error types for catalog operations
//!
//! This module defines the errors that can occur while resolving
//! a logical query name to its SQL text.

use std::path::PathBuf;
use thiserror::Error;

/// Query catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid query name '{0}'")]
    InvalidName(String),

    #[error("Could not load query '{name}' from {}: {source}", .path.display())]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Name of the query that failed to resolve
    pub fn query_name(&self) -> &str {
        match self {
            CatalogError::InvalidName(name) => name,
            CatalogError::Io { name, .. } => name,
        }
    }
}
