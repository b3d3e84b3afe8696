//! Shared value types for list queries and relation introspection

use crate::args::Args;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A `key=value` filter forwarded to a list query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub value: String,
}

impl Filter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Comma separated values, empty items dropped
    pub fn values(&self) -> Vec<&str> {
        self.value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// Window and filters of a list request
///
/// Filters are not interpreted here; the named list query decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginate {
    pub limit: i64,
    pub offset: i64,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Default for Paginate {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}

impl Paginate {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset,
            filters: Vec::new(),
        }
    }

    /// Window of the 1-based `page`; non-positive inputs fall back to page 1 and the default size
    pub fn page(page: i64, size: i64) -> Self {
        let size = if size > 0 { size } else { DEFAULT_PAGE_SIZE };
        let page = page.max(1);
        Self::new(size, (page - 1).saturating_mul(size))
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::new(key, value));
        self
    }

    /// First filter named `key`
    pub fn filter(&self, key: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.key == key)
    }

    /// Comma separated values of the first filter named `key`, empty when absent
    pub fn filter_values(&self, key: &str) -> Vec<String> {
        self.filter(key)
            .map(|f| f.values().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// `limit, offset` as trailing arguments
    pub fn bind_window(&self, args: Args) -> Args {
        args.bind(self.limit).bind(self.offset)
    }
}

/// Key projection of a paginated list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FetchList {
    pub id: Uuid,
    pub total_count: i64,
}

/// One page of records with the size of the full result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A foreign key as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Relation {
    pub constraint_name: String,
    pub table_name: String,
    pub column_name: String,
    pub foreign_table_name: String,
    pub foreign_column_name: String,
}
