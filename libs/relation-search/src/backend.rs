//! Data access needed by relation search.
//!
//! Relation search only needs two things from the database: the dialect of
//! the connection, and the morph classes currently stored in a polymorphic
//! type column. Any storage backend can implement [`SearchBackend`].

use crate::query_builder::Dialect;
use crate::Result;
use async_trait::async_trait;
use sqlx::{PgPool, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Dialect of the active connection.
    fn dialect(&self) -> Dialect;

    /// Distinct non-null values of `type_column` in `table`.
    ///
    /// Errors are returned unchanged to the caller; no retry is attempted.
    async fn distinct_morph_types(&self, table: &str, type_column: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl<B: SearchBackend + ?Sized> SearchBackend for Arc<B> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    async fn distinct_morph_types(&self, table: &str, type_column: &str) -> Result<Vec<String>> {
        (**self).distinct_morph_types(table, type_column).await
    }
}

fn distinct_morph_types_sql(dialect: Dialect, table: &str, type_column: &str) -> String {
    let column = dialect.quote_identifier(type_column);
    format!(
        "SELECT DISTINCT {} FROM {} WHERE {} IS NOT NULL",
        column,
        dialect.quote_identifier(table),
        column
    )
}

#[async_trait]
impl SearchBackend for PgPool {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn distinct_morph_types(&self, table: &str, type_column: &str) -> Result<Vec<String>> {
        let sql = distinct_morph_types_sql(Dialect::Postgres, table, type_column);
        let types = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(self)
            .await?;
        Ok(types)
    }
}

#[async_trait]
impl SearchBackend for SqlitePool {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn distinct_morph_types(&self, table: &str, type_column: &str) -> Result<Vec<String>> {
        let sql = distinct_morph_types_sql(Dialect::Sqlite, table, type_column);
        let types = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(self)
            .await?;
        Ok(types)
    }
}

/// Backend with a fixed dialect and fixed morph type values.
///
/// Useful when the SQL is rendered for a connection owned elsewhere, or to
/// build predicates without a database.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    dialect: Dialect,
    morph_types: HashMap<(String, String), Vec<String>>,
}

impl StaticBackend {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            morph_types: HashMap::new(),
        }
    }

    pub fn with_morph_types<I, S>(mut self, table: &str, type_column: &str, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.morph_types.insert(
            (table.to_string(), type_column.to_string()),
            types.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[async_trait]
impl SearchBackend for StaticBackend {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn distinct_morph_types(&self, table: &str, type_column: &str) -> Result<Vec<String>> {
        Ok(self
            .morph_types
            .get(&(table.to_string(), type_column.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
