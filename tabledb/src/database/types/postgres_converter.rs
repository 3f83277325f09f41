//! PostgreSQL-specific row converter

use super::converter::{extract_failed, wrong_row_type, Row, TypeConverter};
use super::value::SqlValue;
use super::DatabaseBackend;
use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

/// PostgreSQL type converter
#[derive(Clone)]
pub struct PostgresTypeConverter;

impl Default for PostgresTypeConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresTypeConverter {
    pub fn new() -> Self {
        PostgresTypeConverter
    }

    fn extract_timestamp(row: &PgRow, index: usize, column: &str) -> Result<SqlValue> {
        if let Ok(dt) = row.try_get::<NaiveDateTime, _>(index) {
            return Ok(SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        row.try_get::<DateTime<Utc>, _>(index)
            .map(|dt| SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .map_err(|e| extract_failed(column, "timestamp", e))
    }
}

impl TypeConverter for PostgresTypeConverter {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    fn extract_column_value(
        &self,
        row: &dyn std::any::Any,
        column_index: usize,
        column_name: &str,
        column_type: &str,
    ) -> Result<SqlValue> {
        let pg_row = row
            .downcast_ref::<PgRow>()
            .ok_or_else(|| wrong_row_type(self.backend()))?;

        if pg_row
            .try_get_raw(column_index)
            .map_err(|e| extract_failed(column_name, "raw value", e))?
            .is_null()
        {
            return Ok(SqlValue::Null);
        }

        match column_type {
            "BOOL" => pg_row
                .try_get::<bool, _>(column_index)
                .map(SqlValue::Bool)
                .map_err(|e| extract_failed(column_name, "boolean", e)),
            "INT2" => pg_row
                .try_get::<i16, _>(column_index)
                .map(|v| SqlValue::Int(i32::from(v)))
                .map_err(|e| extract_failed(column_name, "smallint", e)),
            "INT4" => pg_row
                .try_get::<i32, _>(column_index)
                .map(SqlValue::Int)
                .map_err(|e| extract_failed(column_name, "int", e)),
            "INT8" => pg_row
                .try_get::<i64, _>(column_index)
                .map(SqlValue::BigInt)
                .map_err(|e| extract_failed(column_name, "bigint", e)),
            "FLOAT4" => pg_row
                .try_get::<f32, _>(column_index)
                .map(SqlValue::Float)
                .map_err(|e| extract_failed(column_name, "float", e)),
            "FLOAT8" => pg_row
                .try_get::<f64, _>(column_index)
                .map(SqlValue::Double)
                .map_err(|e| extract_failed(column_name, "double", e)),
            "NUMERIC" => pg_row
                .try_get::<rust_decimal::Decimal, _>(column_index)
                .map(SqlValue::Decimal)
                .map_err(|e| extract_failed(column_name, "numeric", e)),
            "JSON" | "JSONB" => pg_row
                .try_get::<JsonValue, _>(column_index)
                .map(SqlValue::Json)
                .map_err(|e| extract_failed(column_name, "JSON", e)),
            "TIMESTAMP" | "TIMESTAMPTZ" => {
                Self::extract_timestamp(pg_row, column_index, column_name)
            }
            "DATE" => pg_row
                .try_get::<NaiveDate, _>(column_index)
                .map(|d| SqlValue::Date(d.to_string()))
                .map_err(|e| extract_failed(column_name, "date", e)),
            "TIME" => pg_row
                .try_get::<NaiveTime, _>(column_index)
                .map(|t| SqlValue::Time(t.to_string()))
                .map_err(|e| extract_failed(column_name, "time", e)),
            "BYTEA" => pg_row
                .try_get::<Vec<u8>, _>(column_index)
                .map(SqlValue::Bytes)
                .map_err(|e| extract_failed(column_name, "bytea", e)),
            _ => match pg_row.try_get::<String, _>(column_index) {
                Ok(s) => Ok(SqlValue::String(s)),
                Err(e) => {
                    log::warn!(
                        "Unknown PostgreSQL type '{}' for column '{}'",
                        column_type,
                        column_name
                    );
                    Err(extract_failed(column_name, "text", e))
                }
            },
        }
    }

    fn row_to_json(&self, row: &dyn std::any::Any) -> Result<Row> {
        let pg_row = row
            .downcast_ref::<PgRow>()
            .ok_or_else(|| wrong_row_type(self.backend()))?;

        let mut obj = Row::new();
        for (i, column) in pg_row.columns().iter().enumerate() {
            let name = column.name();
            let type_name = column.type_info().name();
            let value = self.extract_column_value(row, i, name, type_name)?;
            obj.insert(name.to_string(), value.to_json());
        }

        Ok(obj)
    }
}
