//! SQLite-specific row converter

use super::converter::{extract_failed, wrong_row_type, Row, TypeConverter};
use super::value::SqlValue;
use super::DatabaseBackend;
use crate::error::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

/// SQLite type converter
#[derive(Clone)]
pub struct SqliteTypeConverter;

impl Default for SqliteTypeConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteTypeConverter {
    pub fn new() -> Self {
        SqliteTypeConverter
    }

    /// Determine the SQLite type affinity
    fn get_type_affinity(type_name: &str) -> SqliteAffinity {
        let upper = type_name.to_uppercase();

        // https://www.sqlite.org/datatype3.html
        if upper.contains("INT") || upper == "BOOLEAN" {
            SqliteAffinity::Integer
        } else if upper.contains("CHAR")
            || upper.contains("CLOB")
            || upper.contains("TEXT")
            || upper.contains("DATE")
            || upper.contains("TIME")
        {
            SqliteAffinity::Text
        } else if upper.contains("BLOB") {
            SqliteAffinity::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            SqliteAffinity::Real
        } else {
            SqliteAffinity::Numeric
        }
    }

    /// Extract a value according to the declared affinity
    ///
    /// SQLite stores whatever it is given, so a column declared `int` may
    /// still hold text. Anything the affinity read refuses goes through the
    /// storage-class fallbacks.
    fn extract_by_affinity(
        row: &SqliteRow,
        index: usize,
        affinity: SqliteAffinity,
    ) -> Option<SqlValue> {
        match affinity {
            SqliteAffinity::Integer => row.try_get::<i64, _>(index).ok().map(SqlValue::BigInt),
            SqliteAffinity::Real => row.try_get::<f64, _>(index).ok().map(SqlValue::Double),
            SqliteAffinity::Text => row.try_get::<String, _>(index).ok().map(SqlValue::String),
            SqliteAffinity::Blob => row.try_get::<Vec<u8>, _>(index).ok().map(SqlValue::Bytes),
            SqliteAffinity::Numeric => None,
        }
    }

    fn extract_fallback(row: &SqliteRow, index: usize) -> Option<SqlValue> {
        if let Ok(val) = row.try_get::<i64, _>(index) {
            Some(SqlValue::BigInt(val))
        } else if let Ok(val) = row.try_get::<f64, _>(index) {
            Some(SqlValue::Double(val))
        } else if let Ok(val) = row.try_get::<String, _>(index) {
            Some(SqlValue::String(val))
        } else {
            row.try_get::<Vec<u8>, _>(index).ok().map(SqlValue::Bytes)
        }
    }
}

/// SQLite type affinity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqliteAffinity {
    Text,
    Numeric,
    Integer,
    Real,
    Blob,
}

impl TypeConverter for SqliteTypeConverter {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::SQLite
    }

    fn extract_column_value(
        &self,
        row: &dyn std::any::Any,
        column_index: usize,
        column_name: &str,
        column_type: &str,
    ) -> Result<SqlValue> {
        let sqlite_row = row
            .downcast_ref::<SqliteRow>()
            .ok_or_else(|| wrong_row_type(self.backend()))?;

        if sqlite_row
            .try_get_raw(column_index)
            .map_err(|e| extract_failed(column_name, "raw value", e))?
            .is_null()
        {
            return Ok(SqlValue::Null);
        }

        let affinity = Self::get_type_affinity(column_type);
        Self::extract_by_affinity(sqlite_row, column_index, affinity)
            .or_else(|| Self::extract_fallback(sqlite_row, column_index))
            .ok_or_else(|| {
                Error::database_query(format!(
                    "Unsupported SQLite value in column '{}' (declared {})",
                    column_name, column_type
                ))
            })
    }

    fn row_to_json(&self, row: &dyn std::any::Any) -> Result<Row> {
        let sqlite_row = row
            .downcast_ref::<SqliteRow>()
            .ok_or_else(|| wrong_row_type(self.backend()))?;

        let mut obj = Row::new();
        for (i, column) in sqlite_row.columns().iter().enumerate() {
            let name = column.name();
            let type_name = column.type_info().name();
            let value = self.extract_column_value(row, i, name, type_name)?;
            obj.insert(name.to_string(), value.to_json());
        }

        Ok(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_rules() {
        assert_eq!(
            SqliteTypeConverter::get_type_affinity("int(11)"),
            SqliteAffinity::Integer
        );
        assert_eq!(
            SqliteTypeConverter::get_type_affinity("varchar(255)"),
            SqliteAffinity::Text
        );
        assert_eq!(
            SqliteTypeConverter::get_type_affinity("DOUBLE"),
            SqliteAffinity::Real
        );
        assert_eq!(
            SqliteTypeConverter::get_type_affinity("decimal(3,5)"),
            SqliteAffinity::Numeric
        );
        assert_eq!(
            SqliteTypeConverter::get_type_affinity("BLOB"),
            SqliteAffinity::Blob
        );
    }
}
