//! INSERT / REPLACE / UPDATE / DELETE / SELECT builders
//!
//! Every builder turns a table name and ordered column → value mappings into
//! a `prepare` template, then fills it. The format of each column is resolved
//! in this order: explicit override from [`Formats`], format declared by the
//! schema, `%s`.
//!
//! Table and column names are written as given.

use crate::database::types::{Record, SqlValue};
use crate::error::QueryError;
use crate::query::dialects::SqlDialect;
use crate::query::format::{ColumnFormat, Formats};
use crate::query::prepare::prepare;
use crate::schema::Schema;

/// Builds escaped statements for one dialect, optionally guided by a schema
#[derive(Clone, Copy)]
pub struct StatementBuilder<'a> {
    dialect: &'a dyn SqlDialect,
    schema: Option<&'a Schema>,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self {
            dialect,
            schema: None,
        }
    }

    /// Use `schema` for columns without an explicit format
    pub fn with_schema(mut self, schema: Option<&'a Schema>) -> Self {
        self.schema = schema;
        self
    }

    /// Format of every column, in order
    pub fn resolve_formats<'c, I>(&self, columns: I, formats: &Formats) -> Vec<ColumnFormat>
    where
        I: IntoIterator<Item = &'c str>,
    {
        columns
            .into_iter()
            .enumerate()
            .map(|(i, column)| {
                formats
                    .explicit(i)
                    .or_else(|| self.schema.and_then(|s| s.column_format(column)))
                    .unwrap_or(ColumnFormat::String)
            })
            .collect()
    }

    /// `INSERT INTO table (a, b) VALUES (…)`
    pub fn insert(&self, table: &str, data: &Record, formats: &Formats) -> Result<String, QueryError> {
        self.insert_replace("INSERT", table, data, formats)
    }

    /// `REPLACE INTO table (a, b) VALUES (…)`
    pub fn replace(&self, table: &str, data: &Record, formats: &Formats) -> Result<String, QueryError> {
        if !self.dialect.supports_replace() {
            return Err(QueryError::UnsupportedFeature {
                backend: self.dialect.backend().to_string(),
                feature: "REPLACE".to_string(),
            });
        }
        self.insert_replace("REPLACE", table, data, formats)
    }

    fn insert_replace(
        &self,
        verb: &str,
        table: &str,
        data: &Record,
        formats: &Formats,
    ) -> Result<String, QueryError> {
        if data.is_empty() {
            return Err(QueryError::InvalidStatement(format!(
                "{} into '{}' without data",
                verb, table
            )));
        }

        let columns: Vec<&str> = data.keys().map(String::as_str).collect();
        let placeholders: Vec<&str> = self
            .resolve_formats(columns.iter().copied(), formats)
            .iter()
            .map(ColumnFormat::placeholder)
            .collect();

        let template = format!(
            "{} INTO {} ({}) VALUES ({})",
            verb,
            literal(table),
            literal(&columns.join(", ")),
            placeholders.join(", ")
        );
        self.fill(&template, data.values())
    }

    /// `UPDATE table SET a = …, b = … WHERE c = … AND d = …`
    pub fn update(
        &self,
        table: &str,
        data: &Record,
        conditions: &Record,
        formats: &Formats,
        where_formats: &Formats,
    ) -> Result<String, QueryError> {
        if data.is_empty() {
            return Err(QueryError::InvalidStatement(format!(
                "UPDATE of '{}' without data",
                table
            )));
        }
        if conditions.is_empty() {
            return Err(QueryError::InvalidStatement(format!(
                "UPDATE of '{}' without WHERE conditions",
                table
            )));
        }

        let template = format!(
            "UPDATE {} SET {} WHERE {}",
            literal(table),
            self.assignments(data, formats, ", "),
            self.assignments(conditions, where_formats, " AND ")
        );
        self.fill(&template, data.values().chain(conditions.values()))
    }

    /// `DELETE FROM table WHERE c = … AND d = …`
    pub fn delete(
        &self,
        table: &str,
        conditions: &Record,
        where_formats: &Formats,
    ) -> Result<String, QueryError> {
        if conditions.is_empty() {
            return Err(QueryError::InvalidStatement(format!(
                "DELETE from '{}' without WHERE conditions",
                table
            )));
        }

        let template = format!(
            "DELETE FROM {} WHERE {}",
            literal(table),
            self.assignments(conditions, where_formats, " AND ")
        );
        self.fill(&template, conditions.values())
    }

    /// `SELECT a, b FROM table [WHERE …]`; no columns selects `*`
    pub fn select(
        &self,
        table: &str,
        columns: &[&str],
        conditions: &Record,
        where_formats: &Formats,
    ) -> Result<String, QueryError> {
        let selected = if columns.is_empty() {
            "*".to_string()
        } else {
            literal(&columns.join(", "))
        };

        let mut template = format!("SELECT {} FROM {}", selected, literal(table));
        if !conditions.is_empty() {
            template.push_str(" WHERE ");
            template.push_str(&self.assignments(conditions, where_formats, " AND "));
        }
        self.fill(&template, conditions.values())
    }

    /// `col = %x` pairs joined by `separator`
    fn assignments(&self, values: &Record, formats: &Formats, separator: &str) -> String {
        let columns: Vec<&str> = values.keys().map(String::as_str).collect();
        self.resolve_formats(columns.iter().copied(), formats)
            .iter()
            .zip(&columns)
            .map(|(format, column)| format!("{} = {}", literal(column), format.placeholder()))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn fill<'v, I>(&self, template: &str, values: I) -> Result<String, QueryError>
    where
        I: Iterator<Item = &'v SqlValue>,
    {
        let args: Vec<SqlValue> = values.cloned().collect();
        let sql = prepare(self.dialect, template, &args)?;

        #[cfg(debug_assertions)]
        log::debug!("StatementBuilder SQL: {}", sql);

        Ok(sql)
    }
}

/// Keep `%` in names from being read as a placeholder
fn literal(name: &str) -> String {
    name.replace('%', "%%")
}
