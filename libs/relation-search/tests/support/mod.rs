pub mod fixtures;

use anyhow::Context as _;
use relation_search::{BindValue, Dialect, RelationSearchEngine, SelectQuery};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub use fixtures::*;

pub struct TestDb {
    pub pool: SqlitePool,
    pub engine: RelationSearchEngine,
}

impl TestDb {
    /// Fresh in-memory database loaded with the blog fixture.
    pub async fn new() -> anyhow::Result<Self> {
        init_tracing();

        // One long-lived connection: every new in-memory connection would
        // see an empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("connect in-memory sqlite")?;

        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("create fixture tables")?;
        sqlx::raw_sql(FIXTURE_SQL)
            .execute(&pool)
            .await
            .context("insert fixture rows")?;

        let engine = RelationSearchEngine::new(Arc::new(blog_schema()), Arc::new(pool.clone()));
        Ok(Self { pool, engine })
    }

    pub async fn execute(&self, sql: &str) -> anyhow::Result<()> {
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Ids of the rows selected by `query`, ascending.
    pub async fn fetch_ids(&self, query: &SelectQuery) -> anyhow::Result<Vec<i64>> {
        let (sql, binds) = query.build_sql(Dialect::Sqlite);
        let sql = format!("SELECT \"id\" FROM ({}) AS \"matched\" ORDER BY \"id\"", sql);

        let mut q = sqlx::query_scalar::<sqlx::Sqlite, i64>(&sql);
        for bind in binds {
            q = match bind {
                BindValue::Text(value) => q.bind(value),
                BindValue::Integer(value) => q.bind(value),
            };
        }
        q.fetch_all(&self.pool)
            .await
            .with_context(|| format!("run search query: {}", sql))
    }
}

fn init_tracing() {
    use std::sync::OnceLock;
    use tracing_subscriber::prelude::*;
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "relation_search=debug,sqlx=warn".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}
