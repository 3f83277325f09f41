//! SQLite dialect

use super::SqlDialect;
use crate::database::types::DatabaseBackend;

/// SQLite dialect
pub struct SQLiteDialect;

impl SQLiteDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SQLiteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for SQLiteDialect {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::SQLite
    }

    fn escape_string(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    // SQLite has no default LIKE escape character
    fn like_escape_clause(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    fn supports_replace(&self) -> bool {
        true
    }

    fn inline_secondary_keys(&self) -> bool {
        false
    }

    fn list_tables_sql(&self) -> String {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name"
            .to_string()
    }

    fn columns_sql(&self, table: &str) -> String {
        format!(
            "SELECT name, type AS data_type, dflt_value AS default_value, \
             CASE WHEN pk > 0 THEN 1 ELSE 0 END AS is_primary \
             FROM pragma_table_info('{}') ORDER BY cid",
            self.escape_string(table)
        )
    }
}
