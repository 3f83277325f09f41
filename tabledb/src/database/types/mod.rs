//! Value and row types shared by the adapters, dialects and statement builders

pub mod converter;
pub mod mysql_converter;
pub mod postgres_converter;
pub mod sqlite_converter;
pub mod value;

// Re-export the main types
pub use converter::{Row, TypeConverter};
pub use mysql_converter::MySqlTypeConverter;
pub use postgres_converter::PostgresTypeConverter;
pub use sqlite_converter::SqliteTypeConverter;
pub use value::{Record, SqlValue};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database backends supported by tabledb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    MySQL,
    MariaDB,
    SQLite,
}

impl DatabaseBackend {
    /// Detect the backend from a connection URL scheme
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_lowercase())
            .ok_or_else(|| Error::config(format!("Database URL has no scheme: {}", url)))?;

        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            "mysql" => Ok(DatabaseBackend::MySQL),
            "mariadb" => Ok(DatabaseBackend::MariaDB),
            "sqlite" => Ok(DatabaseBackend::SQLite),
            other => Err(Error::config(format!(
                "Unsupported database URL scheme '{}'. Use postgres://, mysql://, mariadb:// or sqlite:",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseBackend::Postgres => "postgres",
            DatabaseBackend::MySQL => "mysql",
            DatabaseBackend::MariaDB => "mariadb",
            DatabaseBackend::SQLite => "sqlite",
        }
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" | "pg" => Ok(DatabaseBackend::Postgres),
            "mysql" => Ok(DatabaseBackend::MySQL),
            "mariadb" => Ok(DatabaseBackend::MariaDB),
            "sqlite" | "sqlite3" => Ok(DatabaseBackend::SQLite),
            other => Err(Error::config(format!("Unknown database backend '{}'", other))),
        }
    }
}
