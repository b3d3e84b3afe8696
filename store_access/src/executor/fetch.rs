//! Read operations returning scanned records

use super::Database;
use crate::args::Args;
use crate::binder::{bind_all, bind_record};
use crate::context::QueryContext;
use crate::errors::DataError;
use crate::traits::{FetchKey, FetchTarget, Model, Record};
use crate::types::{FetchList, Page};
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

impl Database {
    /// Fetch records by primary key with the destination's named fetch query
    ///
    /// A single-record destination fails with `NotFound` when no row matches; a
    /// `Vec` destination silently drops keys that do not exist.
    pub async fn fetch<D, K>(&self, ctx: &QueryContext, keys: &[K]) -> Result<D, DataError>
    where
        D: FetchTarget,
        K: FetchKey,
    {
        let query = <D::Item as Model>::fetch_query();
        let items: Vec<D::Item> = self
            .guarded(ctx, query, move || async move {
                let pool = self.pool()?;
                let sql = self.sql(query)?;
                let args = K::bind_keys(keys).into_arguments()?;
                sqlx::query_as_with::<_, D::Item, _>(sql, args)
                    .fetch_all(pool)
                    .await
                    .map_err(|e| DataError::from_sqlx(query, e))
            })
            .await?;

        crate::debug_log!(
            query,
            keys = keys.len(),
            rows = items.len(),
            "fetched records"
        );

        let mut target = D::from_items(items).ok_or_else(|| {
            DataError::NotFound(format!("{} ({})", <D::Item as Model>::table_name(), query))
        })?;
        bind_all(target.items_mut());
        Ok(target)
    }

    /// Exactly one record from a named query
    pub async fn get<T: Record>(
        &self,
        ctx: &QueryContext,
        name: &str,
        args: Args,
    ) -> Result<T, DataError> {
        let row: Option<T> = self
            .guarded(ctx, name, move || async move {
                let pool = self.pool()?;
                let sql = self.sql(name)?;
                sqlx::query_as_with::<_, T, _>(sql, args.into_arguments()?)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| DataError::from_sqlx(name, e))
            })
            .await?;

        let mut record = row.ok_or_else(|| DataError::NotFound(name.to_string()))?;
        bind_record(&mut record);
        Ok(record)
    }

    /// All rows of a named query, scanned into plain row types
    ///
    /// No embedded fields are bound; use `fetch` for records.
    pub async fn select<T>(
        &self,
        ctx: &QueryContext,
        name: &str,
        args: Args,
    ) -> Result<Vec<T>, DataError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.guarded(ctx, name, move || async move {
            let pool = self.pool()?;
            let sql = self.sql(name)?;
            sqlx::query_as_with::<_, T, _>(sql, args.into_arguments()?)
                .fetch_all(pool)
                .await
                .map_err(|e| DataError::from_sqlx(name, e))
        })
        .await
    }

    /// One page of records: a list query yielding [`FetchList`] rows, then a fetch by those keys
    ///
    /// Items come back in list order. `key_of` extracts the key a record was fetched by.
    pub async fn fetch_page<T, F>(
        &self,
        ctx: &QueryContext,
        list_query: &str,
        args: Args,
        key_of: F,
    ) -> Result<Page<T>, DataError>
    where
        T: Record,
        F: Fn(&T) -> Uuid,
    {
        let list: Vec<FetchList> = self.select(ctx, list_query, args).await?;
        let Some(total_count) = list.first().map(|entry| entry.total_count) else {
            return Ok(Page::empty());
        };

        let keys: Vec<Uuid> = list.iter().map(|entry| entry.id).collect();
        let mut items: Vec<T> = self.fetch(ctx, &keys).await?;

        let position: HashMap<Uuid, usize> =
            keys.iter().enumerate().map(|(i, key)| (*key, i)).collect();
        items.sort_by_key(|item| position.get(&key_of(item)).copied().unwrap_or(usize::MAX));

        Ok(Page { items, total_count })
    }
}
