//! Introspection of installed tables and their columns
//!
//! Results are cached on the connection until a caller forces a refresh.

use crate::database::connection::Connection;
use crate::database::types::Row;
use crate::error::Result;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Description of one installed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub primary_key: bool,
    pub data_type: String,
    /// Literal default, `None` for NULL, generated and timestamp defaults
    pub default: Option<String>,
    /// Text and binary columns
    pub blob: bool,
}

/// Cached introspection results of one connection
#[derive(Debug, Default, Clone)]
pub(crate) struct IntrospectionCache {
    tables: Option<Vec<String>>,
    columns: HashMap<String, IndexMap<String, ColumnInfo>>,
}

impl IntrospectionCache {
    pub(crate) fn clear(&mut self) {
        self.tables = None;
        self.columns.clear();
    }
}

/// Introspection view over a connection
pub struct InformationSchema<'c> {
    connection: &'c mut Connection,
}

impl<'c> InformationSchema<'c> {
    pub(crate) fn new(connection: &'c mut Connection) -> Self {
        Self { connection }
    }

    /// Names of the installed tables
    pub async fn tables(&mut self, force_refresh: bool) -> Result<Vec<String>> {
        if force_refresh || self.connection.introspection.tables.is_none() {
            let sql = self.connection.dialect().list_tables_sql();
            let rows = self.connection.fetch_rows(&sql).await?;
            let names: Vec<String> = rows
                .iter()
                .filter_map(|row| row.values().next().and_then(json_text))
                .collect();
            self.connection.introspection.tables = Some(names);
        }
        Ok(self
            .connection
            .introspection
            .tables
            .clone()
            .unwrap_or_default())
    }

    /// Columns of an installed table, in table order
    ///
    /// An unknown table yields an empty map.
    pub async fn columns(
        &mut self,
        table: &str,
        force_refresh: bool,
    ) -> Result<IndexMap<String, ColumnInfo>> {
        if force_refresh || !self.connection.introspection.columns.contains_key(table) {
            let sql = self.connection.dialect().columns_sql(table);
            let rows = self.connection.fetch_rows(&sql).await?;
            let columns = column_infos(&rows);
            self.connection
                .introspection
                .columns
                .insert(table.to_string(), columns);
        }
        Ok(self
            .connection
            .introspection
            .columns
            .get(table)
            .cloned()
            .unwrap_or_default())
    }
}

fn column_infos(rows: &[Row]) -> IndexMap<String, ColumnInfo> {
    let blob = Regex::new(r"(?i)(text|blob|bytea)").ok();

    rows.iter()
        .filter_map(|row| {
            let name = row.get("name").and_then(json_text)?;
            let data_type = row.get("data_type").and_then(json_text).unwrap_or_default();
            let info = ColumnInfo {
                primary_key: row.get("is_primary").map(json_truthy).unwrap_or(false),
                blob: blob.as_ref().is_some_and(|re| re.is_match(&data_type)),
                default: row
                    .get("default_value")
                    .and_then(json_text)
                    .and_then(|d| normalize_default(&d)),
                data_type,
            };
            Some((name, info))
        })
        .collect()
}

/// Reduce a catalog default to its literal value
fn normalize_default(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("current_timestamp")
        || trimmed.to_lowercase().contains("nextval(")
    {
        return None;
    }

    // 'draft'::character varying
    if let Ok(re) = Regex::new(r"^'(.*)'(::.+)?$") {
        if let Some(caps) = re.captures(trimmed) {
            return caps.get(1).map(|m| m.as_str().replace("''", "'"));
        }
    }
    Some(trimmed.to_string())
}

fn json_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn json_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(s) => matches!(s.as_str(), "1" | "t" | "true" | "YES" | "PRI"),
        _ => false,
    }
}
