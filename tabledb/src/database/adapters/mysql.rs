//! MySQL/MariaDB database adapter implementation

use crate::database::adapter::{connect_timeout, DatabaseAdapter, QueryResult};
use crate::database::config::DatabaseConfig;
use crate::database::types::{DatabaseBackend, MySqlTypeConverter, Row, TypeConverter};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::sync::Arc;

/// MySQL database adapter, also used for MariaDB
#[derive(Clone)]
pub struct MySqlAdapter {
    name: String,
    backend: DatabaseBackend,
    pool: Arc<MySqlPool>,
    converter: MySqlTypeConverter,
}

impl MySqlAdapter {
    /// Create a new MySQL adapter
    pub async fn connect(
        name: impl Into<String>,
        config: &DatabaseConfig,
        backend: DatabaseBackend,
    ) -> Result<Self> {
        // sqlx only knows the mysql:// scheme
        let url = match config.url.strip_prefix("mariadb://") {
            Some(rest) => format!("mysql://{}", rest),
            None => config.url.clone(),
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(connect_timeout(config))
            .connect(&url)
            .await
            .map_err(|e| Error::database_connection(format!("Failed to connect to MySQL: {}", e)))?;

        let mut adapter = Self::from_pool(name, pool);
        adapter.backend = backend;
        Ok(adapter)
    }

    /// Create adapter from existing pool
    pub fn from_pool(name: impl Into<String>, pool: MySqlPool) -> Self {
        Self {
            name: name.into(),
            backend: DatabaseBackend::MySQL,
            pool: Arc::new(pool),
            converter: MySqlTypeConverter::new(),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn row_to_json(&self, row: &sqlx::mysql::MySqlRow) -> Result<Row> {
        self.converter.row_to_json(row)
    }
}

#[async_trait]
impl DatabaseAdapter for MySqlAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        #[cfg(debug_assertions)]
        log::debug!("MySQL EXECUTE: {}", sql);

        let result = sqlx::query(sql)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("MySQL execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id() as i64),
        })
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>> {
        #[cfg(debug_assertions)]
        log::debug!("MySQL FETCH_ALL: {}", sql);

        let rows = sqlx::query(sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::database_query(format!("MySQL fetch_all failed: {}", e)))?;

        rows.iter().map(|row| self.row_to_json(row)).collect()
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::database_connection(format!("MySQL ping failed: {}", e)))
    }
}
