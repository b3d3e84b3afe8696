//! Query catalog implementation
//!
//! This module provides the `QueryCatalog`, a read-mostly cache of SQL templates
//! keyed by logical query name.

use crate::errors::CatalogError;
use crate::source::{DirectorySource, QuerySource};
use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::RwLock;

/// Cache of named SQL templates
///
/// Entries are never evicted or refreshed: a changed query file takes effect only
/// after the catalog is rebuilt. Because entries live as long as the process, the
/// cached text is handed out as `&'static str`.
#[derive(Debug)]
pub struct QueryCatalog {
    source: Box<dyn QuerySource>,
    cache: RwLock<HashMap<String, &'static str>>,
}

impl QueryCatalog {
    /// Create a catalog reading `<sql_dir>/<name>.sql` files
    pub fn new<P: AsRef<Path>>(sql_dir: P) -> Self {
        Self::with_source(DirectorySource::new(sql_dir.as_ref()))
    }

    /// Create a catalog over a custom source
    pub fn with_source<S: QuerySource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `name` to its SQL text, reading the source only on a cache miss
    ///
    /// Two callers missing at the same time may both read the source; both write
    /// the same text, so the race is harmless.
    pub fn load(&self, name: &str) -> Result<&'static str, CatalogError> {
        if let Some(sql) = self.cached(name) {
            return Ok(sql);
        }

        validate_name(name)?;
        let text = self.source.read(name)?;
        tracing::debug!(query = name, bytes = text.len(), "loaded query template");

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        let sql = *cache
            .entry(name.to_string())
            .or_insert_with(|| Box::leak(text.into_boxed_str()));
        Ok(sql)
    }

    /// Seed an entry that does not come from the source
    ///
    /// An existing entry is kept; returns whether `sql` was inserted.
    pub fn register(&self, name: &str, sql: &str) -> Result<bool, CatalogError> {
        validate_name(name)?;
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        if cache.contains_key(name) {
            return Ok(false);
        }
        cache.insert(name.to_string(), Box::leak(sql.to_owned().into_boxed_str()));
        Ok(true)
    }

    /// Whether `name` is cached or can be loaded from the source
    pub fn contains(&self, name: &str) -> bool {
        self.cached(name).is_some() || (validate_name(name).is_ok() && self.source.exists(name))
    }

    /// Number of cached templates
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, name: &str) -> Option<&'static str> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.get(name).copied()
    }
}

/// Logical names are relative paths without parent components
fn validate_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::InvalidName(name.to_string()));
    }
    let path = Path::new(name);
    let relative = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !relative {
        return Err(CatalogError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts reads so tests can observe cache hits
    #[derive(Debug)]
    struct CountingSource {
        inner: DirectorySource,
        reads: Arc<AtomicUsize>,
    }

    impl QuerySource for CountingSource {
        fn read(&self, name: &str) -> Result<String, CatalogError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(name)
        }

        fn exists(&self, name: &str) -> bool {
            self.inner.exists(name)
        }
    }

    fn catalog_with(files: &[(&str, &str)]) -> (tempfile::TempDir, QueryCatalog, Arc<AtomicUsize>) {
        let dir = tempfile::tempdir().unwrap();
        for (name, sql) in files {
            let path = dir.path().join(format!("{}.sql", name));
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, sql).unwrap();
        }
        let reads = Arc::new(AtomicUsize::new(0));
        let catalog = QueryCatalog::with_source(CountingSource {
            inner: DirectorySource::new(dir.path()),
            reads: reads.clone(),
        });
        (dir, catalog, reads)
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let (_dir, catalog, reads) =
            catalog_with(&[("users/fetch", "SELECT * FROM users WHERE id = ANY($1)")]);

        let first = catalog.load("users/fetch").unwrap();
        let second = catalog.load("users/fetch").unwrap();

        assert_eq!(first, second);
        assert_eq!(first, "SELECT * FROM users WHERE id = ANY($1)");
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn cached_text_survives_file_changes() {
        let (dir, catalog, _reads) = catalog_with(&[("ping", "SELECT 1")]);
        assert_eq!(catalog.load("ping").unwrap(), "SELECT 1");

        std::fs::write(dir.path().join("ping.sql"), "SELECT 2").unwrap();
        assert_eq!(catalog.load("ping").unwrap(), "SELECT 1");
    }

    #[test]
    fn missing_file_is_an_io_error_and_not_cached() {
        let (_dir, catalog, reads) = catalog_with(&[]);

        let err = catalog.load("contracts/missing").unwrap_err();
        assert!(matches!(&err, CatalogError::Io { name, .. } if name == "contracts/missing"));
        assert!(catalog.load("contracts/missing").is_err());
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert!(catalog.is_empty());
    }

    #[test]
    fn rejects_names_escaping_the_directory() {
        let (_dir, catalog, reads) = catalog_with(&[]);

        for name in ["", "  ", "../secrets", "/etc/passwd", "users/../../x"] {
            assert!(
                matches!(catalog.load(name), Err(CatalogError::InvalidName(_))),
                "name {:?} should be rejected",
                name
            );
        }
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn registered_entries_do_not_touch_the_source() {
        let (_dir, catalog, reads) = catalog_with(&[("relations", "SELECT 'from file'")]);

        assert!(catalog.register("builtin", "SELECT 'builtin'").unwrap());
        assert!(!catalog.register("builtin", "SELECT 'other'").unwrap());
        assert_eq!(catalog.load("builtin").unwrap(), "SELECT 'builtin'");
        assert!(catalog.contains("relations"));
        assert!(!catalog.contains("absent"));
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_loads_agree() {
        let (_dir, catalog, _reads) = catalog_with(&[("shared", "SELECT now()")]);
        let catalog = Arc::new(catalog);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = catalog.clone();
                std::thread::spawn(move || catalog.load("shared").unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "SELECT now()");
        }
        assert_eq!(catalog.len(), 1);
    }
}
