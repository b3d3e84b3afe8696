//! Relation introspection
//!
//! Foreign keys are read from `information_schema` and matched against the
//! associations a record type declares. Loading follows matched relations,
//! fetches each related record by key and assigns it to the declaring record.

use crate::args;
use crate::context::QueryContext;
use crate::errors::DataError;
use crate::executor::Database;
use crate::traits::{FetchKey, Record};
use crate::types::Relation;
use futures::future::BoxFuture;
use std::collections::HashSet;

/// Catalog name of the foreign key query; a `relations.sql` file overrides the built-in text
pub const RELATIONS_QUERY: &str = "relations";

pub const RELATIONS_SQL: &str = "\
SELECT tc.constraint_name::text AS constraint_name,
       tc.table_name::text AS table_name,
       kcu.column_name::text AS column_name,
       ccu.table_name::text AS foreign_table_name,
       ccu.column_name::text AS foreign_column_name
FROM information_schema.table_constraints AS tc
JOIN information_schema.key_column_usage AS kcu
  ON tc.constraint_name = kcu.constraint_name
 AND tc.table_schema = kcu.table_schema
JOIN information_schema.constraint_column_usage AS ccu
  ON ccu.constraint_name = tc.constraint_name
 AND ccu.table_schema = tc.table_schema
WHERE tc.constraint_type = 'FOREIGN KEY'
  AND tc.table_name = $1
ORDER BY tc.constraint_name";

/// Tables whose associations were already expanded during one load
type Visited = HashSet<&'static str>;

type LoadFn<M> = Box<
    dyn for<'a> Fn(
            &'a Database,
            &'a QueryContext,
            &'a mut M,
            &'a mut Visited,
        ) -> BoxFuture<'a, Result<bool, DataError>>
        + Send
        + Sync,
>;

fn loader<M, F>(f: F) -> LoadFn<M>
where
    F: for<'a> Fn(
            &'a Database,
            &'a QueryContext,
            &'a mut M,
            &'a mut Visited,
        ) -> BoxFuture<'a, Result<bool, DataError>>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

/// A record type with statically declared related record types
pub trait Related: Record {
    fn associations() -> Vec<Association<Self>>;
}

/// One related record type of `M`, reached through a foreign key column of `M`'s table
pub struct Association<M> {
    table: &'static str,
    column: &'static str,
    load: LoadFn<M>,
}

impl<M> std::fmt::Debug for Association<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Association")
            .field("table", &self.table)
            .field("column", &self.column)
            .finish()
    }
}

impl<M: Record> Association<M> {
    /// `column` of `M`'s table references `R`'s table
    ///
    /// `key` reads the foreign key from the record, `assign` stores the fetched
    /// related record. A record without key, or whose related row is gone, is left as is.
    pub fn belongs_to<R, K>(
        column: &'static str,
        key: fn(&M) -> Option<K>,
        assign: fn(&mut M, R),
    ) -> Self
    where
        R: Related,
        K: FetchKey,
    {
        Self {
            table: R::table_name(),
            column,
            load: loader(move |db, ctx, model, visited| {
                Box::pin(async move {
                    let Some(key) = key(&*model) else {
                        return Ok(false);
                    };
                    let mut related: R = match db.fetch(ctx, std::slice::from_ref(&key)).await {
                        Ok(related) => related,
                        Err(e) if e.is_not_found() => return Ok(false),
                        Err(e) => return Err(e),
                    };
                    db.load_nested(ctx, &mut related, visited).await?;
                    assign(model, related);
                    Ok(true)
                })
            }),
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    fn matches(&self, relation: &Relation) -> bool {
        relation.foreign_table_name == self.table && relation.column_name == self.column
    }
}

impl Database {
    /// Foreign keys declared on `table`
    pub async fn get_relations(
        &self,
        ctx: &QueryContext,
        table: &str,
    ) -> Result<Vec<Relation>, DataError> {
        self.select(ctx, RELATIONS_QUERY, args![table]).await
    }

    /// Populate the declared associations of `model` that the store knows a foreign key for
    ///
    /// Related records are loaded recursively; the associations of each table are
    /// expanded at most once per call, so cyclic foreign keys terminate. Returns
    /// the relations that were populated on `model` itself.
    pub async fn load_relations<M: Related>(
        &self,
        ctx: &QueryContext,
        model: &mut M,
    ) -> Result<Vec<Relation>, DataError> {
        let mut visited = Visited::new();
        self.load_nested(ctx, model, &mut visited).await
    }

    async fn load_nested<M: Related>(
        &self,
        ctx: &QueryContext,
        model: &mut M,
        visited: &mut Visited,
    ) -> Result<Vec<Relation>, DataError> {
        if !visited.insert(M::table_name()) {
            return Ok(Vec::new());
        }
        let associations = M::associations();
        if associations.is_empty() {
            return Ok(Vec::new());
        }

        let mut loaded = Vec::new();
        for relation in self.get_relations(ctx, M::table_name()).await? {
            let Some(association) = associations.iter().find(|a| a.matches(&relation)) else {
                continue;
            };
            if (association.load)(self, ctx, &mut *model, &mut *visited).await? {
                tracing::debug!(
                    table = %relation.table_name,
                    column = %relation.column_name,
                    related = %relation.foreign_table_name,
                    "loaded relation"
                );
                loaded.push(relation);
            }
        }
        Ok(loaded)
    }
}
