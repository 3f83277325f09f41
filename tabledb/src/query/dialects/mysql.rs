//! MySQL/MariaDB dialect

use super::SqlDialect;
use crate::database::types::DatabaseBackend;

/// MySQL/MariaDB dialect
pub struct MySQLDialect {
    backend: DatabaseBackend,
}

impl MySQLDialect {
    pub fn new(backend: DatabaseBackend) -> Self {
        Self { backend }
    }
}

impl Default for MySQLDialect {
    fn default() -> Self {
        Self::new(DatabaseBackend::MySQL)
    }
}

impl SqlDialect for MySQLDialect {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    /// Same character set as `mysql_real_escape_string`
    fn escape_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 8);
        for c in value.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\x1a' => out.push_str("\\Z"),
                c => out.push(c),
            }
        }
        out
    }

    fn supports_replace(&self) -> bool {
        true
    }

    fn inline_secondary_keys(&self) -> bool {
        true
    }

    fn table_options(&self, charset: Option<&str>, collate: Option<&str>) -> String {
        let mut options = String::new();
        if let Some(charset) = charset.filter(|c| !c.is_empty()) {
            options.push_str(&format!(" DEFAULT CHARACTER SET {}", charset));
        }
        if let Some(collate) = collate.filter(|c| !c.is_empty()) {
            options.push_str(&format!(" COLLATE {}", collate));
        }
        options
    }

    fn list_tables_sql(&self) -> String {
        "SHOW TABLES".to_string()
    }

    fn columns_sql(&self, table: &str) -> String {
        format!(
            "SELECT COLUMN_NAME AS name, COLUMN_TYPE AS data_type, \
             COLUMN_DEFAULT AS default_value, \
             CASE WHEN COLUMN_KEY = 'PRI' THEN 1 ELSE 0 END AS is_primary \
             FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = '{}' \
             ORDER BY ORDINAL_POSITION",
            self.escape_string(table)
        )
    }
}
