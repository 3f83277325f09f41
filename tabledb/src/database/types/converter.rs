//! Row conversion trait shared by the driver-specific converters

use super::value::SqlValue;
use super::DatabaseBackend;
use crate::error::{Error, Result};
use serde_json::{Map, Value as JsonValue};

/// One fetched row: column name → JSON cell, in select-list order
pub type Row = Map<String, JsonValue>;

/// Trait for database-specific row conversion
///
/// Each adapter owns a converter that turns its driver row type into
/// `SqlValue`s and from there into a JSON object.
pub trait TypeConverter: Send + Sync {
    /// Get the database backend this converter is for
    fn backend(&self) -> DatabaseBackend;

    /// Extract a column value from a database row
    ///
    /// `row` is the driver row (`MySqlRow`, `PgRow` or `SqliteRow`) passed as
    /// `Any` so the trait stays object safe.
    fn extract_column_value(
        &self,
        row: &dyn std::any::Any,
        column_index: usize,
        column_name: &str,
        column_type: &str,
    ) -> Result<SqlValue>;

    /// Convert a whole row to a JSON object
    fn row_to_json(&self, row: &dyn std::any::Any) -> Result<Row>;
}

/// Error for a row that was handed to the wrong converter
pub(crate) fn wrong_row_type(backend: DatabaseBackend) -> Error {
    Error::database_query(format!("Invalid row type for {} converter", backend))
}

/// Error for a cell the driver refused to decode
pub(crate) fn extract_failed(column: &str, what: &str, err: impl std::fmt::Display) -> Error {
    Error::database_query(format!(
        "Failed to extract {} from column '{}': {}",
        what, column, err
    ))
}
