use crate::context::QueryContext;
use crate::errors::DataError;
use crate::relation::{RELATIONS_QUERY, RELATIONS_SQL};
use circuit_breaker::CircuitBreaker;
use query_catalog::QueryCatalog;
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;

/// Store handle shared by every data access of the process
///
/// All operations run through the one breaker held here, so a failure anywhere
/// trips protection for every table and query.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Option<PgPool>,
    catalog: Arc<QueryCatalog>,
    breaker: Arc<CircuitBreaker>,
}

impl Database {
    pub fn new(pool: PgPool, catalog: Arc<QueryCatalog>, breaker: Arc<CircuitBreaker>) -> Self {
        Self::build(Some(pool), catalog, breaker)
    }

    /// A handle without store; every store call fails with `Connectivity`
    pub fn disconnected(catalog: Arc<QueryCatalog>, breaker: Arc<CircuitBreaker>) -> Self {
        Self::build(None, catalog, breaker)
    }

    fn build(
        pool: Option<PgPool>,
        catalog: Arc<QueryCatalog>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        // A relations.sql file in the query directory takes precedence
        if !catalog.contains(RELATIONS_QUERY) {
            if let Err(e) = catalog.register(RELATIONS_QUERY, RELATIONS_SQL) {
                tracing::warn!(error = %e, "could not register built-in relations query");
            }
        }
        Self {
            pool,
            catalog,
            breaker,
        }
    }

    /// The pool, or `Connectivity` when none is configured or it was closed
    pub fn pool(&self) -> Result<&PgPool, DataError> {
        match &self.pool {
            Some(pool) if !pool.is_closed() => Ok(pool),
            Some(_) => Err(DataError::Connectivity("pool is closed".to_string())),
            None => Err(DataError::Connectivity(
                "no database connection configured".to_string(),
            )),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.pool().is_ok()
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Close the pool; later calls fail with `Connectivity`
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }

    /// Round-trip to the store through the breaker
    pub async fn ping(&self, ctx: &QueryContext) -> Result<(), DataError> {
        self.guarded(ctx, "ping", move || async move {
            sqlx::query("SELECT 1")
                .execute(self.pool()?)
                .await
                .map(|_| ())
                .map_err(|e| DataError::from_sqlx("ping", e))
        })
        .await
    }

    /// Resolve a query name through the catalog
    pub(crate) fn sql(&self, name: &str) -> Result<&'static str, DataError> {
        Ok(self.catalog.load(name)?)
    }

    /// Run one unit of work through the breaker under the context deadline
    ///
    /// Everything `op` returns as `Err` counts as a store failure, including a
    /// catalog miss. A deadline hit drops `op`, which the breaker records as a failure.
    pub(crate) async fn guarded<T, F, Fut>(
        &self,
        ctx: &QueryContext,
        operation: &str,
        op: F,
    ) -> Result<T, DataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DataError>>,
    {
        crate::trace_log!(operation, breaker = self.breaker.name(), "guarded call");
        ctx.run(operation, async {
            self.breaker.execute(op).await.map_err(DataError::from)
        })
        .await
    }
}
