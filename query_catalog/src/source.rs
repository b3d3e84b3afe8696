//! Query text sources
//!
//! A `QuerySource` produces the raw SQL text for a logical query name. The catalog
//! only consults its source on a cache miss.

use crate::errors::CatalogError;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Backing store for SQL templates
pub trait QuerySource: Send + Sync + Debug {
    /// Read the SQL text for `name`
    fn read(&self, name: &str) -> Result<String, CatalogError>;

    /// Whether `name` can be read from this source
    fn exists(&self, name: &str) -> bool;
}

/// Reads `<root>/<name>.sql` from the filesystem
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path a logical name resolves to
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.sql", name))
    }
}

impl QuerySource for DirectorySource {
    fn read(&self, name: &str) -> Result<String, CatalogError> {
        let path = self.path_for(name);
        std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            name: name.to_string(),
            path,
            source,
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }
}
