//! PostgreSQL database adapter implementation

use crate::database::adapter::{connect_timeout, DatabaseAdapter, QueryResult};
use crate::database::config::DatabaseConfig;
use crate::database::types::{DatabaseBackend, PostgresTypeConverter, Row, TypeConverter};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row as _};
use std::sync::Arc;

/// PostgreSQL database adapter
#[derive(Clone)]
pub struct PostgresAdapter {
    name: String,
    pool: Arc<PgPool>,
    converter: PostgresTypeConverter,
}

impl PostgresAdapter {
    /// Create a new PostgreSQL adapter
    pub async fn connect(name: impl Into<String>, config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(connect_timeout(config))
            .connect(&config.url)
            .await
            .map_err(|e| {
                Error::database_connection(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        Ok(Self::from_pool(name, pool))
    }

    /// Create adapter from existing pool
    pub fn from_pool(name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            name: name.into(),
            pool: Arc::new(pool),
            converter: PostgresTypeConverter::new(),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_json(&self, row: &sqlx::postgres::PgRow) -> Result<Row> {
        self.converter.row_to_json(row)
    }
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("insert"))
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        #[cfg(debug_assertions)]
        log::debug!("PostgreSQL EXECUTE: {}", sql);

        // lastval() is session scoped, so the insert and the lookup share a connection
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::database_connection(format!("PostgreSQL acquire failed: {}", e)))?;

        let result = sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| Error::database_query(format!("PostgreSQL execute failed: {}", e)))?;

        // Tables without a sequence make lastval() fail; that only means there is no id
        let last_insert_id = if is_insert(sql) {
            sqlx::query("SELECT lastval()")
                .fetch_one(&mut *conn)
                .await
                .ok()
                .and_then(|row| row.try_get::<i64, _>(0).ok())
        } else {
            None
        };

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id,
        })
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>> {
        #[cfg(debug_assertions)]
        log::debug!("PostgreSQL FETCH_ALL: {}", sql);

        let rows = sqlx::query(sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("PostgreSQL fetch_all failed: {}", e)))?;

        rows.iter().map(|row| self.row_to_json(row)).collect()
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::database_connection(format!("PostgreSQL ping failed: {}", e)))
    }
}
