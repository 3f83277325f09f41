//! Connections and drivers
//!
//! Adapters run literal SQL on MySQL/MariaDB, PostgreSQL and SQLite through
//! sqlx; [`Connection`] layers schemas, prefixes and per-query state on top
//! of one adapter and [`DatabaseRegistry`] keeps several of them by name.

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod connection;
pub mod information_schema;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use adapter::{connect_adapter, DatabaseAdapter, QueryResult};
pub use adapters::{MySqlAdapter, PostgresAdapter, SqliteAdapter};
pub use config::{DatabaseConfig, DatabaseConfigBuilder, DatabasesConfig};
pub use connection::{Connection, CreateStatus, DropStatus, StatementKind};
pub use information_schema::{ColumnInfo, InformationSchema};
pub use registry::{DatabaseRegistry, SharedConnection};
pub use types::{DatabaseBackend, Record, Row, SqlValue, TypeConverter};
