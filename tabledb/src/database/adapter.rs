//! Database adapter trait for multi-database support
//!
//! Statements reach the driver as complete SQL text: escaping has already
//! been done by `prepare`, so adapters never bind parameters.

use crate::database::config::DatabaseConfig;
use crate::database::types::{DatabaseBackend, Row};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Result type for statements that modify data
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryResult {
    /// Number of rows affected by the statement
    pub rows_affected: u64,
    /// Last inserted ID (if applicable)
    pub last_insert_id: Option<i64>,
}

/// Unified database adapter trait
///
/// Implemented for MySQL/MariaDB, PostgreSQL and SQLite on top of sqlx pools.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Get the name of this database connection
    fn name(&self) -> &str;

    /// Get the database backend type
    fn backend(&self) -> DatabaseBackend;

    /// Execute a statement that does not return rows
    ///
    /// # Returns
    /// * `Ok(QueryResult)` - Result with affected rows and last insert ID
    /// * `Err(Error)` - If the statement fails
    async fn execute(&self, sql: &str) -> Result<QueryResult>;

    /// Fetch all rows of a query
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>>;

    /// Test database connectivity
    async fn ping(&self) -> Result<bool>;
}

/// Build the adapter matching the URL scheme of `config`
pub async fn connect_adapter(
    name: &str,
    config: &DatabaseConfig,
) -> Result<Box<dyn DatabaseAdapter>> {
    use crate::database::adapters::{MySqlAdapter, PostgresAdapter, SqliteAdapter};

    let backend = DatabaseBackend::from_url(&config.url)?;
    log::debug!("Connecting database '{}' ({})", name, backend);

    let adapter: Box<dyn DatabaseAdapter> = match backend {
        DatabaseBackend::Postgres => Box::new(PostgresAdapter::connect(name, config).await?),
        DatabaseBackend::MySQL | DatabaseBackend::MariaDB => {
            Box::new(MySqlAdapter::connect(name, config, backend).await?)
        }
        DatabaseBackend::SQLite => Box::new(SqliteAdapter::connect(name, config).await?),
    };
    Ok(adapter)
}

pub(crate) fn connect_timeout(config: &DatabaseConfig) -> Duration {
    Duration::from_secs(config.connect_timeout)
}
