//! MySQL/MariaDB-specific row converter

use super::converter::{extract_failed, wrong_row_type, Row, TypeConverter};
use super::value::SqlValue;
use super::DatabaseBackend;
use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

/// MySQL type converter
#[derive(Clone)]
pub struct MySqlTypeConverter;

impl Default for MySqlTypeConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MySqlTypeConverter {
    pub fn new() -> Self {
        MySqlTypeConverter
    }

    /// Integers of any width, signed or unsigned
    fn extract_integer(row: &MySqlRow, index: usize, column: &str) -> Result<SqlValue> {
        if let Ok(val) = row.try_get::<i64, _>(index) {
            return Ok(SqlValue::BigInt(val));
        }
        if let Ok(val) = row.try_get::<u64, _>(index) {
            return Ok(SqlValue::UnsignedBigInt(val));
        }
        if let Ok(val) = row.try_get::<i8, _>(index) {
            return Ok(SqlValue::Int(i32::from(val)));
        }
        row.try_get::<bool, _>(index)
            .map(|b| SqlValue::Int(i32::from(b)))
            .map_err(|e| extract_failed(column, "integer", e))
    }

    fn extract_datetime(row: &MySqlRow, index: usize, column: &str) -> Result<SqlValue> {
        if let Ok(dt) = row.try_get::<NaiveDateTime, _>(index) {
            return Ok(SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        if let Ok(dt) = row.try_get::<DateTime<Utc>, _>(index) {
            return Ok(SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        row.try_get::<String, _>(index)
            .map(SqlValue::DateTime)
            .map_err(|e| extract_failed(column, "datetime", e))
    }

    fn extract_decimal(row: &MySqlRow, index: usize, column: &str) -> Result<SqlValue> {
        if let Ok(d) = row.try_get::<rust_decimal::Decimal, _>(index) {
            return Ok(SqlValue::Decimal(d));
        }
        if let Ok(s) = row.try_get::<String, _>(index) {
            return Ok(s
                .parse::<rust_decimal::Decimal>()
                .map(SqlValue::Decimal)
                .unwrap_or(SqlValue::String(s)));
        }
        row.try_get::<f64, _>(index)
            .map(SqlValue::Double)
            .map_err(|e| extract_failed(column, "decimal", e))
    }

    /// Text that the server may hand back as binary (information_schema on MySQL 8)
    fn extract_text_or_bytes(row: &MySqlRow, index: usize, column: &str) -> Result<SqlValue> {
        if let Ok(s) = row.try_get::<String, _>(index) {
            return Ok(SqlValue::String(s));
        }
        let bytes = row
            .try_get::<Vec<u8>, _>(index)
            .map_err(|e| extract_failed(column, "binary", e))?;
        Ok(match String::from_utf8(bytes) {
            Ok(s) => SqlValue::String(s),
            Err(e) => SqlValue::Bytes(e.into_bytes()),
        })
    }
}

impl TypeConverter for MySqlTypeConverter {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::MySQL
    }

    fn extract_column_value(
        &self,
        row: &dyn std::any::Any,
        column_index: usize,
        column_name: &str,
        column_type: &str,
    ) -> Result<SqlValue> {
        let mysql_row = row
            .downcast_ref::<MySqlRow>()
            .ok_or_else(|| wrong_row_type(self.backend()))?;

        if mysql_row
            .try_get_raw(column_index)
            .map_err(|e| extract_failed(column_name, "raw value", e))?
            .is_null()
        {
            return Ok(SqlValue::Null);
        }

        let type_name = column_type.to_uppercase();
        match type_name.as_str() {
            t if t.contains("INT") || t == "BOOLEAN" || t == "BOOL" || t == "YEAR" => {
                Self::extract_integer(mysql_row, column_index, column_name)
            }
            "FLOAT" => mysql_row
                .try_get::<f32, _>(column_index)
                .map(SqlValue::Float)
                .map_err(|e| extract_failed(column_name, "float", e)),
            "DOUBLE" | "REAL" => mysql_row
                .try_get::<f64, _>(column_index)
                .map(SqlValue::Double)
                .map_err(|e| extract_failed(column_name, "double", e)),
            "DECIMAL" | "NUMERIC" => Self::extract_decimal(mysql_row, column_index, column_name),
            "JSON" => mysql_row
                .try_get::<JsonValue, _>(column_index)
                .map(SqlValue::Json)
                .map_err(|e| extract_failed(column_name, "JSON", e)),
            "DATE" => mysql_row
                .try_get::<NaiveDate, _>(column_index)
                .map(|d| SqlValue::Date(d.to_string()))
                .map_err(|e| extract_failed(column_name, "date", e)),
            "TIME" => mysql_row
                .try_get::<NaiveTime, _>(column_index)
                .map(|t| SqlValue::Time(t.to_string()))
                .map_err(|e| extract_failed(column_name, "time", e)),
            "DATETIME" | "TIMESTAMP" => {
                Self::extract_datetime(mysql_row, column_index, column_name)
            }
            _ => {
                let value = Self::extract_text_or_bytes(mysql_row, column_index, column_name);
                if value.is_err() {
                    log::warn!(
                        "Unknown MySQL type '{}' for column '{}'",
                        type_name,
                        column_name
                    );
                }
                value
            }
        }
    }

    fn row_to_json(&self, row: &dyn std::any::Any) -> Result<Row> {
        let mysql_row = row
            .downcast_ref::<MySqlRow>()
            .ok_or_else(|| wrong_row_type(self.backend()))?;

        let mut obj = Row::new();
        for (i, column) in mysql_row.columns().iter().enumerate() {
            let name = column.name();
            let type_name = column.type_info().name();
            let value = self.extract_column_value(row, i, name, type_name)?;
            obj.insert(name.to_string(), value.to_json());
        }

        Ok(obj)
    }
}
