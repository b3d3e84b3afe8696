//! Core QueryHaus functionality
//!
//! This module contains the main QueryHaus struct, which builds the pool, the query
//! catalog and the circuit breaker once and hands out the shared `Database`.

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use circuit_breaker::{CircuitBreaker, Settings, StateChange};
use config::AppConfig;
use query_catalog::QueryCatalog;
use sqlx::PgPool;
use store_access::{Database, QueryContext};
use tokio::sync::mpsc;

use crate::bootstrap;
use crate::errors::QueryHausError;

/// Everything needed to connect
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub url: String,
    pub sql_dir: PathBuf,
    pub breaker: Settings,
    pub create_if_missing: bool,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>, sql_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            sql_dir: sql_dir.into(),
            breaker: Settings::from(&config::BreakerConfig::default()),
            create_if_missing: false,
            min_connections: 1,
            max_connections: 10,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: None,
        }
    }

    pub fn with_breaker(mut self, breaker: Settings) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn with_pool_size(mut self, min_connections: u32, max_connections: u32) -> Self {
        self.min_connections = min_connections;
        self.max_connections = max_connections;
        self
    }
}

impl From<&AppConfig> for ConnectOptions {
    fn from(config: &AppConfig) -> Self {
        let db = &config.database;
        let seconds = |s: u64| (s > 0).then(|| Duration::from_secs(s));
        Self {
            url: db.url.clone(),
            sql_dir: PathBuf::from(&db.sql_dir),
            breaker: Settings::from(&config.breaker),
            create_if_missing: db.create_if_missing,
            min_connections: db.min_connections,
            max_connections: db.max_connections,
            connection_timeout: db.connection_timeout(),
            idle_timeout: seconds(db.idle_timeout_seconds),
            max_lifetime: seconds(db.max_lifetime_seconds),
        }
    }
}

/// Main QueryHaus handle owning the shared database access
///
/// Dereferences to [`Database`], so every data operation is available directly.
#[derive(Debug, Clone)]
pub struct QueryHaus {
    db: Database,
}

impl QueryHaus {
    /// Connect, verify the store answers and build the breaker and catalog
    pub async fn connect(options: ConnectOptions) -> Result<Self, QueryHausError> {
        if options.create_if_missing {
            bootstrap::ensure_database(&options.url).await?;
        }

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.connection_timeout)
            .idle_timeout(options.idle_timeout);

        // Set max lifetime if specified
        if options.max_lifetime.is_some() {
            pool_options = pool_options.max_lifetime(options.max_lifetime);
        }

        let pool = pool_options.connect(&options.url).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;

        let breaker = Arc::new(CircuitBreaker::new(options.breaker));
        let catalog = Arc::new(QueryCatalog::new(&options.sql_dir));

        tracing::info!(
            breaker = breaker.name(),
            sql_dir = %options.sql_dir.display(),
            "database connected"
        );

        Ok(Self {
            db: Database::new(pool, catalog, breaker),
        })
    }

    /// Connect with a validated application configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self, QueryHausError> {
        config.validate()?;
        Self::connect(ConnectOptions::from(config)).await
    }

    /// Wrap an already built database handle
    pub fn with_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Get database pool reference
    pub fn pool(&self) -> Result<&PgPool, QueryHausError> {
        Ok(self.db.pool()?)
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        self.db.breaker()
    }

    /// Stream of breaker state changes
    ///
    /// Once the receiver is dropped, the observer feeding it is unregistered at
    /// the next transition.
    pub fn watch_breaker(&self) -> mpsc::UnboundedReceiver<StateChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.db
            .breaker()
            .subscribe(move |change| tx.send(change.clone()).is_ok());
        rx
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), QueryHausError> {
        self.db.ping(&QueryContext::background()).await?;
        Ok(())
    }

    /// Close the pool; every later data call fails with a connectivity error
    pub async fn close(&self) {
        self.db.close().await;
    }
}

impl Deref for QueryHaus {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://localhost/app"
            sql_dir = "queries"
            max_lifetime_seconds = 120

            [breaker]
            name = "primary"
            max_requests = 0
            timeout_seconds = 0
            "#,
        )
        .unwrap();
        let options = ConnectOptions::from(&config);

        assert_eq!(options.sql_dir, PathBuf::from("queries"));
        assert_eq!(options.max_lifetime, Some(Duration::from_secs(120)));
        assert_eq!(options.idle_timeout, Some(Duration::from_secs(600)));
        assert_eq!(options.breaker.name, "primary");
        assert_eq!(options.breaker.failure_threshold, 3);
        assert!(!options.create_if_missing);
    }

    #[tokio::test]
    async fn watch_breaker_reports_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let breaker = Arc::new(CircuitBreaker::new(
            Settings::new("watched").with_failure_threshold(1),
        ));
        let haus = QueryHaus::with_database(Database::disconnected(
            Arc::new(QueryCatalog::new(dir.path())),
            breaker,
        ));
        let mut changes = haus.watch_breaker();

        assert!(haus.health_check().await.is_err());
        let change = changes.recv().await.unwrap();
        assert!(change.is_trip());
        assert_eq!(change.breaker, "watched");
    }

    #[tokio::test]
    async fn dropped_watchers_are_unregistered() {
        let dir = tempfile::tempdir().unwrap();
        let breaker = Arc::new(CircuitBreaker::new(
            Settings::new("watched")
                .with_failure_threshold(1)
                .with_timeout(Duration::from_millis(20)),
        ));
        let haus = QueryHaus::with_database(Database::disconnected(
            Arc::new(QueryCatalog::new(dir.path())),
            breaker,
        ));

        let kept = haus.watch_breaker();
        drop(haus.watch_breaker());
        assert_eq!(haus.breaker().observers().callback_count(), 2);

        // Closed -> Open
        assert!(haus.health_check().await.is_err());
        assert_eq!(haus.breaker().observers().callback_count(), 1);

        drop(kept);
        tokio::time::sleep(Duration::from_millis(40)).await;
        // Open -> HalfOpen
        haus.breaker().state();
        assert_eq!(haus.breaker().observers().callback_count(), 0);
    }
}
