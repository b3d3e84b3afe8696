//! Named write statements

use super::Database;
use crate::args::{Args, Params};
use crate::context::QueryContext;
use crate::errors::DataError;
use sqlx::postgres::PgQueryResult;
use sqlx::PgConnection;

impl Database {
    /// Run a named write on a pooled connection
    ///
    /// A batch runs inside one transaction, so either every argument set is
    /// applied or none is.
    pub async fn execute(
        &self,
        ctx: &QueryContext,
        name: &str,
        params: impl Into<Params>,
    ) -> Result<PgQueryResult, DataError> {
        let params = params.into();
        self.guarded(ctx, name, move || async move {
            let pool = self.pool()?;
            let sql = self.sql(name)?;
            match params {
                Params::Positional(args) => {
                    let mut conn = pool
                        .acquire()
                        .await
                        .map_err(|e| DataError::from_sqlx(name, e))?;
                    run_once(&mut conn, name, sql, args).await
                }
                Params::Batch(batch) => {
                    let mut tx = pool
                        .begin()
                        .await
                        .map_err(|e| DataError::from_sqlx(name, e))?;
                    let result = run_batch(&mut tx, name, sql, batch).await?;
                    tx.commit()
                        .await
                        .map_err(|e| DataError::from_sqlx(name, e))?;
                    Ok(result)
                }
            }
        })
        .await
    }

    /// Run a named write on the caller's connection or transaction
    pub async fn tx_execute(
        &self,
        ctx: &QueryContext,
        conn: &mut PgConnection,
        name: &str,
        params: impl Into<Params>,
    ) -> Result<PgQueryResult, DataError> {
        let params = params.into();
        self.guarded(ctx, name, move || async move {
            let sql = self.sql(name)?;
            match params {
                Params::Positional(args) => run_once(conn, name, sql, args).await,
                Params::Batch(batch) => run_batch(conn, name, sql, batch).await,
            }
        })
        .await
    }
}

async fn run_once(
    conn: &mut PgConnection,
    name: &str,
    sql: &'static str,
    args: Args,
) -> Result<PgQueryResult, DataError> {
    sqlx::query_with(sql, args.into_arguments()?)
        .execute(conn)
        .await
        .map_err(|e| DataError::from_sqlx(name, e))
}

async fn run_batch(
    conn: &mut PgConnection,
    name: &str,
    sql: &'static str,
    batch: Vec<Args>,
) -> Result<PgQueryResult, DataError> {
    let mut total = PgQueryResult::default();
    for args in batch {
        let result = run_once(&mut *conn, name, sql, args).await?;
        total.extend(std::iter::once(result));
    }
    crate::debug_log!(query = name, rows = total.rows_affected(), "batch applied");
    Ok(total)
}
