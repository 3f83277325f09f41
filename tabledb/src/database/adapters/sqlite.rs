//! SQLite database adapter implementation

use crate::database::adapter::{connect_timeout, DatabaseAdapter, QueryResult};
use crate::database::config::DatabaseConfig;
use crate::database::types::{DatabaseBackend, Row, SqliteTypeConverter, TypeConverter};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

/// SQLite database adapter
#[derive(Clone)]
pub struct SqliteAdapter {
    name: String,
    pool: Arc<SqlitePool>,
    converter: SqliteTypeConverter,
}

impl SqliteAdapter {
    /// Create a new SQLite adapter
    ///
    /// An in-memory database exists once per driver connection, so
    /// `sqlite::memory:` URLs get a single connection that never expires.
    pub async fn connect(name: impl Into<String>, config: &DatabaseConfig) -> Result<Self> {
        let in_memory = config.url.contains(":memory:") || config.url.contains("mode=memory");

        let mut options = SqlitePoolOptions::new().acquire_timeout(connect_timeout(config));
        options = if in_memory {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
        };

        let pool = options
            .connect(&config.url)
            .await
            .map_err(|e| Error::database_connection(format!("Failed to connect to SQLite: {}", e)))?;

        Ok(Self::from_pool(name, pool))
    }

    /// Create adapter from existing pool
    pub fn from_pool(name: impl Into<String>, pool: SqlitePool) -> Self {
        Self {
            name: name.into(),
            pool: Arc::new(pool),
            converter: SqliteTypeConverter::new(),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_json(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Row> {
        self.converter.row_to_json(row)
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::SQLite
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        #[cfg(debug_assertions)]
        log::debug!("SQLite EXECUTE: {}", sql);

        let result = sqlx::query(sql)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("SQLite execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>> {
        #[cfg(debug_assertions)]
        log::debug!("SQLite FETCH_ALL: {}", sql);

        let rows = sqlx::query(sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("SQLite fetch_all failed: {}", e)))?;

        rows.iter().map(|row| self.row_to_json(row)).collect()
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::database_connection(format!("SQLite ping failed: {}", e)))
    }
}
