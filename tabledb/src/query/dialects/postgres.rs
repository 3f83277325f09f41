//! PostgreSQL dialect

use super::SqlDialect;
use crate::database::types::DatabaseBackend;

/// PostgreSQL dialect, assuming `standard_conforming_strings = on`
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for PostgresDialect {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    fn escape_string(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    fn supports_replace(&self) -> bool {
        false
    }

    fn inline_secondary_keys(&self) -> bool {
        false
    }

    fn list_tables_sql(&self) -> String {
        "SELECT table_name::text AS table_name FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
         ORDER BY table_name"
            .to_string()
    }

    fn columns_sql(&self, table: &str) -> String {
        format!(
            "SELECT c.column_name::text AS name, c.data_type::text AS data_type, \
             c.column_default::text AS default_value, \
             CASE WHEN EXISTS ( \
               SELECT 1 FROM information_schema.table_constraints tc \
               JOIN information_schema.key_column_usage k \
                 ON k.constraint_name = tc.constraint_name AND k.table_name = tc.table_name \
               WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_name = c.table_name \
                 AND k.column_name = c.column_name \
             ) THEN 1 ELSE 0 END AS is_primary \
             FROM information_schema.columns c \
             WHERE c.table_schema = current_schema() AND c.table_name = '{}' \
             ORDER BY c.ordinal_position",
            self.escape_string(table)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_single_quotes_only() {
        let d = PostgresDialect::new();
        assert_eq!(d.escape_string("O'Brien"), "O''Brien");
        assert_eq!(d.escape_string("back\\slash"), "back\\slash");
        assert!(!d.supports_replace());
    }
}
