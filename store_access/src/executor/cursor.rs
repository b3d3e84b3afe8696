//! Live row cursors over named queries

use super::Database;
use crate::args::Args;
use crate::context::QueryContext;
use crate::errors::DataError;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection};

type RowStream<'c> = BoxStream<'c, Result<PgRow, sqlx::Error>>;

/// Rows of a named query, read on demand
///
/// The first row is read while the call is still guarded by the breaker, so a
/// failing store counts against it; later rows stream without breaker
/// accounting. Dropping the cursor releases its connection.
pub struct Cursor<'c> {
    query: String,
    ctx: QueryContext,
    first: Option<PgRow>,
    rows: RowStream<'c>,
    done: bool,
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("query", &self.query)
            .field("done", &self.done)
            .finish()
    }
}

impl<'c> Cursor<'c> {
    async fn open(
        query: &str,
        ctx: QueryContext,
        mut rows: RowStream<'c>,
    ) -> Result<Cursor<'c>, DataError> {
        let first = rows
            .try_next()
            .await
            .map_err(|e| DataError::from_sqlx(query, e))?;
        Ok(Cursor {
            query: query.to_string(),
            ctx,
            done: first.is_none(),
            first,
            rows,
        })
    }

    /// Logical name of the query being read
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Next row, `None` once the result is exhausted
    pub async fn next(&mut self) -> Result<Option<PgRow>, DataError> {
        if let Some(row) = self.first.take() {
            return Ok(Some(row));
        }
        if self.done {
            return Ok(None);
        }

        let Cursor {
            query, ctx, rows, ..
        } = self;
        let query = query.as_str();
        let row = ctx
            .run(query, async {
                rows.try_next()
                    .await
                    .map_err(|e| DataError::from_sqlx(query, e))
            })
            .await?;
        self.done = row.is_none();
        Ok(row)
    }

    /// Next row scanned into `T`
    pub async fn next_as<T>(&mut self) -> Result<Option<T>, DataError>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        match self.next().await? {
            Some(row) => T::from_row(&row)
                .map(Some)
                .map_err(|e| DataError::from_sqlx(&self.query, e)),
            None => Ok(None),
        }
    }

    /// Scan every remaining row into `T`
    pub async fn try_collect<T>(mut self) -> Result<Vec<T>, DataError>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        let mut out = Vec::new();
        while let Some(item) = self.next_as::<T>().await? {
            out.push(item);
        }
        Ok(out)
    }

    /// Read and discard the remaining rows, returning how many there were
    pub async fn close(mut self) -> Result<usize, DataError> {
        let mut drained = 0;
        while self.next().await?.is_some() {
            drained += 1;
        }
        Ok(drained)
    }
}

impl Database {
    /// Open a cursor over a named query on a pooled connection
    pub async fn query(
        &self,
        ctx: &QueryContext,
        name: &str,
        args: Args,
    ) -> Result<Cursor<'_>, DataError> {
        self.guarded(ctx, name, move || async move {
            let pool = self.pool()?;
            let sql = self.sql(name)?;
            let rows = sqlx::query_with(sql, args.into_arguments()?).fetch(pool);
            Cursor::open(name, *ctx, rows).await
        })
        .await
    }

    /// Open a cursor over a named query on the caller's connection or transaction
    pub async fn tx_query<'c>(
        &self,
        ctx: &QueryContext,
        conn: &'c mut PgConnection,
        name: &str,
        args: Args,
    ) -> Result<Cursor<'c>, DataError> {
        self.guarded(ctx, name, move || async move {
            let sql = self.sql(name)?;
            let rows = sqlx::query_with(sql, args.into_arguments()?).fetch(conn);
            Cursor::open(name, *ctx, rows).await
        })
        .await
    }
}
