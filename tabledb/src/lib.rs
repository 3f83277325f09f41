//! tabledb - schema-driven SQL for MySQL, PostgreSQL and SQLite
//!
//! tabledb provides:
//! - table schemas with format inference (`%d`, `%f`, `%s`)
//! - `prepare`, a placeholder substitution with per-backend escaping
//! - INSERT / REPLACE / UPDATE / DELETE / SELECT builders
//! - CREATE TABLE / DROP TABLE from schemas
//! - a connection with per-query state, a table facade and models

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod database;
pub mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod table;

// Re-export main types for public API
pub use database::{
    Connection, CreateStatus, DatabaseBackend, DatabaseConfig, DatabaseRegistry, DatabasesConfig,
    DropStatus, Record, Row, SqlValue,
};
pub use error::{Error, QueryError, Result};
pub use models::{Model, ModelHooks, ModelRegistry, Selection};
pub use query::{prepare, ColumnFormat, DdlWriter, Formats, StatementBuilder};
pub use schema::{Column, ColumnKind, IndexType, Relation, RelationType, Schema};
pub use table::Table;

/// Build a [`Record`] from `column => value` pairs, keeping their order
///
/// ```
/// let row = tabledb::record! { "id" => 7, "title" => "Hello" };
/// assert_eq!(row.keys().collect::<Vec<_>>(), vec!["id", "title"]);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.insert(::std::string::String::from($column), $crate::SqlValue::from($value));
        )+
        record
    }};
}

/// Build the argument list of [`prepare`]
///
/// ```
/// let args = tabledb::params![5, "draft"];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::SqlValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::SqlValue::from($value)),+]
    };
}
