//! Transaction support for Database
//!
//! This module provides an explicit transaction handle. The layer never rolls
//! back on its own; a handle dropped without `commit` is rolled back by the driver.

use super::Database;
use crate::context::QueryContext;
use crate::errors::DataError;
use sqlx::{PgConnection, Postgres, Transaction};

/// A transaction holding one pooled connection until commit or rollback
///
/// # Example
/// ```ignore
/// let ctx = QueryContext::background();
/// let mut tx = db.begin(&ctx).await?;
///
/// db.tx_execute(&ctx, tx.as_mut(), "wallets/debit", args![from, 100]).await?;
/// db.tx_execute(&ctx, tx.as_mut(), "wallets/credit", args![to, 100]).await?;
///
/// tx.commit().await?;
/// ```
#[derive(Debug)]
pub struct DataTransaction {
    tx: Transaction<'static, Postgres>,
}

impl Database {
    /// Begin a new database transaction
    pub async fn begin(&self, ctx: &QueryContext) -> Result<DataTransaction, DataError> {
        let tx = self
            .guarded(ctx, "begin", move || async move {
                self.pool()?
                    .begin()
                    .await
                    .map_err(|e| DataError::from_sqlx("begin", e))
            })
            .await?;
        Ok(DataTransaction { tx })
    }
}

impl DataTransaction {
    /// Commit the transaction
    pub async fn commit(self) -> Result<(), DataError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DataError::from_sqlx("commit", e))
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> Result<(), DataError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DataError::from_sqlx("rollback", e))
    }

    /// The transaction's connection, for `tx_query` and `tx_execute`
    pub fn as_mut(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}
