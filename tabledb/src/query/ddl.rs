//! CREATE TABLE / DROP TABLE from a schema
//!
//! MySQL and MariaDB get the classic layout with inline `UNIQUE KEY` and
//! `KEY` lines and optional charset/collation options. Backends without
//! inline secondary keys get `CONSTRAINT … UNIQUE` lines and one
//! `CREATE INDEX` statement per key.

use crate::query::dialects::SqlDialect;
use crate::schema::Schema;

/// Renders table DDL for one dialect
pub struct DdlWriter<'a> {
    dialect: &'a dyn SqlDialect,
    charset: Option<&'a str>,
    collate: Option<&'a str>,
}

impl<'a> DdlWriter<'a> {
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self {
            dialect,
            charset: None,
            collate: None,
        }
    }

    pub fn charset(mut self, charset: Option<&'a str>) -> Self {
        self.charset = charset;
        self
    }

    pub fn collate(mut self, collate: Option<&'a str>) -> Self {
        self.collate = collate;
        self
    }

    /// The `CREATE TABLE` statement alone
    pub fn create_table(&self, schema: &Schema) -> String {
        let inline_keys = self.dialect.inline_secondary_keys();
        let mut sql = format!("CREATE TABLE {} (", schema.name());

        for (name, declaration) in schema.columns() {
            sql.push_str(&format!("\n  {} {},", name, declaration));
        }
        if let Some(pk) = schema.primary_key() {
            sql.push_str(&format!("\n  PRIMARY KEY  ({}),", pk));
        }
        for (name, columns) in schema.unique_keys() {
            let columns = columns.join(",");
            if inline_keys {
                sql.push_str(&format!("\n  UNIQUE KEY {} ({}),", name, columns));
            } else {
                sql.push_str(&format!("\n  CONSTRAINT {} UNIQUE ({}),", name, columns));
            }
        }
        if inline_keys {
            for (name, columns) in schema.keys() {
                sql.push_str(&format!("\n  KEY {} ({}),", name, columns.join(",")));
            }
        }

        let mut sql = sql.trim_end_matches(',').to_string();
        sql.push_str("\n)");
        sql.push_str(&self.dialect.table_options(self.charset, self.collate));
        sql.push(';');
        sql
    }

    /// `CREATE TABLE` followed by the `CREATE INDEX` statements it needs
    pub fn create_table_statements(&self, schema: &Schema) -> Vec<String> {
        let mut statements = vec![self.create_table(schema)];
        if !self.dialect.inline_secondary_keys() {
            statements.extend(schema.keys().iter().map(|(name, columns)| {
                format!(
                    "CREATE INDEX {} ON {} ({});",
                    name,
                    schema.name(),
                    columns.join(",")
                )
            }));
        }
        statements
    }

    pub fn drop_table(&self, schema: &Schema) -> String {
        format!("DROP TABLE {}", schema.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::types::DatabaseBackend;
    use crate::query::dialects::create_dialect;

    fn postmeta() -> Schema {
        Schema::builder("postmeta")
            .table_prefix("wp_")
            .column("meta_id", "bigint(20) unsigned NOT NULL AUTO_INCREMENT")
            .column("post_id", "bigint(20) unsigned NOT NULL default '0'")
            .column("meta_key", "varchar(255) default NULL")
            .primary_key("meta_id")
            .unique_key("post_meta", ["post_id", "meta_key"])
            .key("meta_key", ["meta_key"])
            .build()
            .unwrap()
    }

    #[test]
    fn mysql_layout() {
        let dialect = create_dialect(DatabaseBackend::MySQL);
        let writer = DdlWriter::new(dialect.as_ref());
        assert_eq!(
            writer.create_table(&postmeta()),
            "CREATE TABLE wp_postmeta (\
             \n  meta_id bigint(20) unsigned NOT NULL AUTO_INCREMENT,\
             \n  post_id bigint(20) unsigned NOT NULL default '0',\
             \n  meta_key varchar(255) default NULL,\
             \n  PRIMARY KEY  (meta_id),\
             \n  UNIQUE KEY post_meta (post_id,meta_key),\
             \n  KEY meta_key (meta_key)\
             \n);"
        );
        assert_eq!(writer.create_table_statements(&postmeta()).len(), 1);
        assert_eq!(writer.drop_table(&postmeta()), "DROP TABLE wp_postmeta");
    }

    #[test]
    fn mysql_charset_options() {
        let dialect = create_dialect(DatabaseBackend::MariaDB);
        let sql = DdlWriter::new(dialect.as_ref())
            .charset(Some("utf8mb4"))
            .collate(Some("utf8mb4_unicode_ci"))
            .create_table(&postmeta());
        assert!(sql.ends_with("\n) DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci;"));
    }

    #[test]
    fn separate_indexes_elsewhere() {
        let dialect = create_dialect(DatabaseBackend::SQLite);
        let statements = DdlWriter::new(dialect.as_ref())
            .charset(Some("utf8"))
            .create_table_statements(&postmeta());
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("\n  CONSTRAINT post_meta UNIQUE (post_id,meta_key)\n);"));
        assert!(!statements[0].contains("KEY meta_key"));
        assert_eq!(
            statements[1],
            "CREATE INDEX meta_key ON wp_postmeta (meta_key);"
        );
    }

    #[test]
    fn no_primary_key_line_without_primary_key() {
        let schema = Schema::builder("log").column("line", "text").build().unwrap();
        let dialect = create_dialect(DatabaseBackend::Postgres);
        assert_eq!(
            DdlWriter::new(dialect.as_ref()).create_table(&schema),
            "CREATE TABLE log (\n  line text\n);"
        );
    }
}
