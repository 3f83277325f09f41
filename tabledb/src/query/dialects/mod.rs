//! Database dialects
//!
//! Everything that differs between backends when turning statements into SQL
//! text: string escaping, LIKE escaping, REPLACE support, how secondary keys
//! are declared and how installed tables are listed.

use crate::database::types::DatabaseBackend;

/// Trait for database-specific SQL generation
pub trait SqlDialect: Send + Sync {
    /// Backend this dialect renders SQL for
    fn backend(&self) -> DatabaseBackend;

    /// Escape a value for use inside a single-quoted string literal
    fn escape_string(&self, value: &str) -> String;

    /// Escape `%` and `_` so a value matches literally in a LIKE pattern
    ///
    /// The result still has to go through [`escape_string`](Self::escape_string).
    fn escape_like(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if matches!(c, '\\' | '%' | '_') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    /// Clause appended after a LIKE pattern so the backslash escapes apply
    fn like_escape_clause(&self) -> &'static str {
        ""
    }

    /// Whether `REPLACE INTO` is understood
    fn supports_replace(&self) -> bool;

    /// Whether `KEY name (cols)` may appear inside `CREATE TABLE`
    fn inline_secondary_keys(&self) -> bool;

    /// Table options appended after the closing parenthesis of `CREATE TABLE`
    fn table_options(&self, charset: Option<&str>, collate: Option<&str>) -> String {
        let _ = (charset, collate);
        String::new()
    }

    /// Query listing installed table names in its first column
    fn list_tables_sql(&self) -> String;

    /// Query describing the columns of `table`
    ///
    /// Every row carries `name`, `data_type`, `default_value`, `is_primary`.
    fn columns_sql(&self, table: &str) -> String;
}

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySQLDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SQLiteDialect;

/// Factory function to create the appropriate dialect for a database backend
pub fn create_dialect(backend: DatabaseBackend) -> Box<dyn SqlDialect> {
    match backend {
        DatabaseBackend::Postgres => Box::new(PostgresDialect::new()),
        DatabaseBackend::MySQL | DatabaseBackend::MariaDB => Box::new(MySQLDialect::new(backend)),
        DatabaseBackend::SQLite => Box::new(SQLiteDialect::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_picks_backend() {
        assert_eq!(
            create_dialect(DatabaseBackend::MariaDB).backend(),
            DatabaseBackend::MariaDB
        );
        assert_eq!(
            create_dialect(DatabaseBackend::SQLite).backend(),
            DatabaseBackend::SQLite
        );
    }

    #[test]
    fn like_escape_marks_wildcards() {
        let dialect = create_dialect(DatabaseBackend::Postgres);
        assert_eq!(dialect.escape_like("50%_off"), "50\\%\\_off");
    }
}
