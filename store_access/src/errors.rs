use circuit_breaker::BreakerError;
use query_catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Database unavailable: {0}")]
    Connectivity(String),

    #[error("Query not found: {source}")]
    QueryNotFound {
        name: String,
        #[source]
        source: CatalogError,
    },

    #[error("Service unavailable: {0}")]
    BreakerOpen(String),

    #[error("Failed to scan result of '{query}': {source}")]
    Scan {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to bind field '{field}': {source}")]
    Bind {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error in '{query}': {source}")]
    Database {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid query argument: {0}")]
    Argument(String),

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),
}

impl DataError {
    /// Classify a driver error raised while running `query`
    pub fn from_sqlx(query: &str, error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DataError::NotFound(query.to_string()),
            sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => DataError::Connectivity(format!("{}: {}", query, error)),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => DataError::Scan {
                query: query.to_string(),
                source: error,
            },
            other => DataError::Database {
                query: query.to_string(),
                source: other,
            },
        }
    }

    /// HTTP status a handler should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            DataError::NotFound(_) => 404,
            DataError::BreakerOpen(_) => 503,
            _ => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}

impl From<CatalogError> for DataError {
    fn from(source: CatalogError) -> Self {
        DataError::QueryNotFound {
            name: source.query_name().to_string(),
            source,
        }
    }
}

impl From<BreakerError<DataError>> for DataError {
    fn from(error: BreakerError<DataError>) -> Self {
        match error {
            BreakerError::Inner(inner) => inner,
            rejected => DataError::BreakerOpen(rejected.to_string()),
        }
    }
}
