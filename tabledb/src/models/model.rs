//! Data access for one table
//!
//! A [`Model`] knows the schema of its table and issues statements on a
//! connection passed to each call. Behavior around writes is customized
//! through [`ModelHooks`] instead of subclassing.

use crate::database::connection::Connection;
use crate::database::types::{Record, Row, SqlValue};
use crate::error::{Error, Result};
use crate::query::{ColumnFormat, Formats};
use crate::schema::{Relationship, Schema};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Callbacks run around a model's writes
///
/// `before_*` hooks may rewrite the data and conditions or abort the write
/// by returning an error. `after_*` hooks see the outcome.
pub trait ModelHooks: Send + Sync {
    fn before_insert(&self, _data: &mut Record) -> Result<()> {
        Ok(())
    }

    fn after_insert(&self, _outcome: &Result<u64>) {}

    fn before_update(&self, _data: &mut Record, _conditions: &mut Record) -> Result<()> {
        Ok(())
    }

    fn after_update(&self, _outcome: &Result<u64>) {}

    fn before_delete(&self, _conditions: &mut Record) -> Result<()> {
        Ok(())
    }

    fn after_delete(&self, _outcome: &Result<u64>) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl ModelHooks for NoHooks {}

/// Rows returned by [`Model::select`]
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Empty,
    One(Row),
    /// Keyed by primary key value, or by position without a selected primary key
    Many(IndexMap<String, Row>),
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }

    pub fn len(&self) -> usize {
        match self {
            Selection::Empty => 0,
            Selection::One(_) => 1,
            Selection::Many(rows) => rows.len(),
        }
    }

    /// Every row, in result order
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Selection::Empty => Vec::new(),
            Selection::One(row) => vec![row],
            Selection::Many(rows) => rows.into_values().collect(),
        }
    }
}

/// Table-bound data access
#[derive(Clone)]
pub struct Model {
    schema: Schema,
    hooks: Arc<dyn ModelHooks>,
}

impl Model {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: impl ModelHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Build the model of a table registered on `connection`
    pub fn for_table(connection: &Connection, table: &str) -> Result<Self> {
        connection
            .schema(table)
            .cloned()
            .map(Self::new)
            .ok_or_else(|| Error::unknown_table(table))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn basename(&self) -> &str {
        self.schema.basename()
    }

    /// Prefixed table name on `connection`
    pub fn table_name(&self, connection: &Connection) -> String {
        connection
            .schema(self.basename())
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| format!("{}{}", connection.prefix(), self.basename()))
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.schema.primary_key()
    }

    pub fn is_column(&self, column: &str) -> bool {
        self.schema.is_column(column)
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.schema.is_key(column)
    }

    pub fn column_format(&self, column: &str) -> Option<ColumnFormat> {
        self.schema.column_format(column)
    }

    pub async fn insert(&self, connection: &mut Connection, data: &Record) -> Result<u64> {
        let mut data = data.clone();
        self.hooks.before_insert(&mut data)?;
        self.schema.validate(&data)?;

        let outcome = connection
            .insert(self.basename(), &data, &Formats::Infer)
            .await;
        self.hooks.after_insert(&outcome);
        outcome
    }

    pub async fn update(&self, connection: &mut Connection, data: &Record, conditions: &Record) -> Result<u64> {
        let mut data = data.clone();
        let mut conditions = conditions.clone();
        self.hooks.before_update(&mut data, &mut conditions)?;
        self.schema.validate(&data)?;

        let outcome = connection
            .update(
                self.basename(),
                &data,
                &conditions,
                &Formats::Infer,
                &Formats::Infer,
            )
            .await;
        self.hooks.after_update(&outcome);
        outcome
    }

    pub async fn delete(&self, connection: &mut Connection, conditions: &Record) -> Result<u64> {
        let mut conditions = conditions.clone();
        self.hooks.before_delete(&mut conditions)?;

        let outcome = connection
            .delete(self.basename(), &conditions, &Formats::Infer)
            .await;
        self.hooks.after_delete(&outcome);
        outcome
    }

    /// Update one column; goes through the update hooks
    pub async fn update_field(
        &self,
        connection: &mut Connection,
        column: &str,
        value: impl Into<SqlValue>,
        conditions: &Record,
    ) -> Result<u64> {
        let mut data = Record::new();
        data.insert(column.to_string(), value.into());
        self.update(connection, &data, conditions).await
    }

    /// Rows matching `conditions`; no columns selects `*`
    pub async fn select(
        &self,
        connection: &mut Connection,
        conditions: &Record,
        columns: &[&str],
    ) -> Result<Selection> {
        let mut rows = connection
            .select(self.basename(), columns, conditions, &Formats::Infer)
            .await?;

        Ok(match rows.len() {
            0 => Selection::Empty,
            1 => Selection::One(rows.remove(0)),
            _ => Selection::Many(self.key_rows(rows)),
        })
    }

    fn key_rows(&self, rows: Vec<Row>) -> IndexMap<String, Row> {
        let pk = self.primary_key();
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| {
                let key = pk
                    .and_then(|pk| row.get(pk))
                    .map(|v| SqlValue::from_json(v).as_text())
                    .unwrap_or_else(|| i.to_string());
                (key, row)
            })
            .collect()
    }

    /// How this table relates to `foreign_table`, from either side's schema
    pub fn relationship(&self, connection: &Connection, foreign_table: &str) -> Option<Relationship> {
        self.schema.relationship(foreign_table).or_else(|| {
            let relation = connection
                .schema(foreign_table)?
                .relations_to(self.basename())?
                .values()
                .next()?
                .clone();
            Relationship::new(relation, self.basename()).ok()
        })
    }

    /// Rows of `foreign_table` related to `row`
    pub async fn related(
        &self,
        connection: &mut Connection,
        foreign_table: &str,
        row: &Row,
    ) -> Result<Vec<Row>> {
        let relationship = self.relationship(connection, foreign_table).ok_or_else(|| {
            Error::schema(format!(
                "No relation between '{}' and '{}'",
                self.basename(),
                foreign_table
            ))
        })?;

        let key = relationship.own_key();
        let value = row
            .get(key)
            .map(SqlValue::from_json)
            .ok_or_else(|| Error::unknown_column(self.basename(), key))?;

        let sql = relationship.related_rows_sql(connection.dialect(), connection.prefix(), &value);
        connection.get_results(Some(&sql)).await
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("table", &self.basename())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> Model {
        Model::new(
            Schema::builder("posts")
                .column("id", "int(11)")
                .column("title", "varchar(100)")
                .primary_key("id")
                .key("title", ["title"])
                .build()
                .unwrap(),
        )
    }

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn schema_queries() {
        let m = model();
        assert_eq!(m.basename(), "posts");
        assert_eq!(m.primary_key(), Some("id"));
        assert!(m.is_column("title"));
        assert!(m.is_key("title"));
        assert_eq!(m.column_format("id"), Some(ColumnFormat::Integer));
        assert_eq!(m.column_format("nope"), None);
    }

    #[test]
    fn many_rows_keyed_by_primary_key() {
        let keyed = model().key_rows(vec![
            row(json!({"id": 3, "title": "a"})),
            row(json!({"id": 5, "title": "b"})),
        ]);
        assert_eq!(keyed.keys().collect::<Vec<_>>(), vec!["3", "5"]);

        let keyed = model().key_rows(vec![row(json!({"title": "a"})), row(json!({"title": "b"}))]);
        assert_eq!(keyed.keys().collect::<Vec<_>>(), vec!["0", "1"]);
    }

    #[test]
    fn selection_shapes() {
        assert!(Selection::Empty.is_empty());
        let one = Selection::One(row(json!({"id": 1})));
        assert_eq!(one.len(), 1);
        assert_eq!(one.into_rows().len(), 1);
    }
}
