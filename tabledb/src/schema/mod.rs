//! Table schemas
//!
//! A [`Schema`] is the static description of one table: its columns with
//! their SQL declarations, its primary key, unique and secondary keys, and
//! relations to other tables. Statement builders use it to pick the format of
//! each column and the DDL writer renders it to `CREATE TABLE`.
//!
//! Schemas are built in code:
//!
//! ```
//! use tabledb::Schema;
//!
//! let schema = Schema::builder("posts")
//!     .column("id", "bigint(20) unsigned NOT NULL AUTO_INCREMENT")
//!     .column("title", "varchar(255) NOT NULL")
//!     .column("author_id", "bigint(20) unsigned NOT NULL")
//!     .primary_key("id")
//!     .key("author", ["author_id"])
//!     .build()
//!     .unwrap();
//! assert_eq!(schema.column_length("title"), Some(Some(255)));
//! ```
//!
//! or loaded from YAML/TOML definition files (see [`SchemaDefinition`]).

pub mod column;
pub mod relation;

pub use column::{Column, ColumnKind, ColumnLength, IndexType};
pub use relation::{Relation, RelationType, Relationship};

use crate::database::types::{Record, SqlValue};
use crate::error::{Error, Result};
use crate::query::dialects::SqlDialect;
use crate::query::prepare::format_value;
use crate::query::ColumnFormat;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static description of one table
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    basename: String,
    name: String,
    columns: IndexMap<String, String>,
    typed_columns: IndexMap<String, Column>,
    primary_key: Option<String>,
    unique_keys: IndexMap<String, Vec<String>>,
    keys: IndexMap<String, Vec<String>>,
    // foreign table -> native column -> relation
    relations: IndexMap<String, IndexMap<String, Relation>>,
}

impl Schema {
    pub fn builder(basename: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(basename)
    }

    /// Unprefixed table name
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Table name including the prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recompute the full name from a new prefix
    pub fn set_table_prefix(&mut self, prefix: &str) {
        self.name = format!("{}{}", prefix, self.basename);
    }

    /// Column name → SQL declaration, in declaration order
    pub fn columns(&self) -> &IndexMap<String, String> {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column_definition(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Typed definition, for columns declared through [`Column`]
    pub fn typed_column(&self, column: &str) -> Option<&Column> {
        self.typed_columns.get(column)
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn unique_keys(&self) -> &IndexMap<String, Vec<String>> {
        &self.unique_keys
    }

    pub fn keys(&self) -> &IndexMap<String, Vec<String>> {
        &self.keys
    }

    pub fn is_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Whether the column is the primary key or part of a unique or secondary key
    pub fn is_key(&self, column: &str) -> bool {
        self.primary_key.as_deref() == Some(column)
            || self
                .unique_keys
                .values()
                .chain(self.keys.values())
                .any(|cols| cols.iter().any(|c| c == column))
    }

    /// Format inferred from the column declaration, `None` for unknown columns
    pub fn column_format(&self, column: &str) -> Option<ColumnFormat> {
        self.columns
            .get(column)
            .map(|decl| ColumnFormat::infer(decl))
    }

    /// Declared length of a column
    ///
    /// The outer `None` means the column does not exist, the inner one that
    /// its declaration has no length. Two-part lengths are summed, so
    /// `decimal(3,5)` gives 8; the sum saturates at `u32::MAX`.
    pub fn column_length(&self, column: &str) -> Option<Option<u32>> {
        let decl = self.columns.get(column)?;
        let Some(open) = decl.find('(') else {
            return Some(None);
        };
        let inner = &decl[open + 1..];
        let inner = inner.find(')').map_or(inner, |close| &inner[..close]);

        let length = inner
            .split(',')
            .map(|part| part.trim().parse::<u32>().unwrap_or(0))
            .fold(0u32, u32::saturating_add);
        Some(Some(length))
    }

    /// WHERE condition for one column
    ///
    /// String columns compare with `LIKE` against the escaped value, wrapped in
    /// `%` wildcards when `like_wildcard` is set; other columns compare with
    /// `=` against the formatted value. `None` for unknown columns.
    pub fn column_where_sql(
        &self,
        column: &str,
        value: &SqlValue,
        like_wildcard: bool,
        dialect: &dyn SqlDialect,
    ) -> Option<String> {
        let format = self.column_format(column)?;
        Some(match format {
            ColumnFormat::String => {
                let mut pattern = dialect.escape_like(&value.as_text());
                if like_wildcard {
                    pattern = format!("%{}%", pattern);
                }
                format!(
                    "{} LIKE '{}'{}",
                    column,
                    dialect.escape_string(&pattern),
                    dialect.like_escape_clause()
                )
            }
            format => format!("{} = {}", column, format_value(dialect, format, value)),
        })
    }

    /// Check every value of `record` that has a typed column definition
    pub fn validate(&self, record: &Record) -> Result<()> {
        for (column, value) in record {
            if let Some(typed) = self.typed_columns.get(column) {
                if !typed.validate(value)? {
                    return Err(Error::validation(format!(
                        "Column '{}': '{}' is not an allowed value",
                        column,
                        value.as_text()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }

    /// Relations to `foreign_table`, keyed by native column
    pub fn relations_to(&self, foreign_table: &str) -> Option<&IndexMap<String, Relation>> {
        self.relations.get(foreign_table)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values().flat_map(|by_column| by_column.values())
    }

    /// Declare a relation from `column` to `foreign_table.foreign_key`
    ///
    /// `foreign_key` may contain `%s`, replaced by this table's basename.
    pub fn add_relation(
        &mut self,
        kind: RelationType,
        column: &str,
        foreign_table: &str,
        foreign_key: &str,
    ) -> Result<&mut Self> {
        if !self.is_column(column) {
            return Err(Error::schema(format!(
                "Invalid table column '{}' for relation on '{}'",
                column, self.basename
            )));
        }
        let relation = Relation::new(kind, &self.basename, column, foreign_table, foreign_key);
        self.relations
            .entry(foreign_table.to_string())
            .or_default()
            .insert(column.to_string(), relation);
        Ok(self)
    }

    /// The first relation to `foreign_table`, seen from this table
    pub fn relationship(&self, foreign_table: &str) -> Option<Relationship> {
        let relation = self.relations.get(foreign_table)?.values().next()?.clone();
        Relationship::new(relation, &self.basename).ok()
    }

    /// Parse a YAML schema definition
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let definition: SchemaDefinition = serde_yaml::from_str(content)?;
        definition.into_schema()
    }

    /// Parse a TOML schema definition
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let definition: SchemaDefinition = toml::from_str(content)?;
        definition.into_schema()
    }

    /// Load a schema definition, picking the parser from the file extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e).with_context(format!("Failed to read schema {}", path.display()))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(Error::schema(format!(
                "Unsupported schema file {}: expected .yaml, .yml or .toml",
                path.display()
            ))),
        }
    }

    /// Serializable form of this schema
    pub fn to_definition(&self) -> SchemaDefinition {
        SchemaDefinition {
            table: self.basename.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, decl)| {
                    let spec = match self.typed_columns.get(name) {
                        Some(typed) => ColumnSpec::Typed(typed.clone()),
                        None => ColumnSpec::Declaration(decl.clone()),
                    };
                    (name.clone(), spec)
                })
                .collect(),
            primary_key: self.primary_key.clone(),
            unique_keys: key_specs(&self.unique_keys),
            keys: key_specs(&self.keys),
            relations: self
                .relations()
                .map(|r| RelationDefinition {
                    kind: r.kind,
                    column: r.native_key.clone(),
                    foreign_table: r.foreign_table.clone(),
                    foreign_key: r.foreign_key.clone(),
                })
                .collect(),
        }
    }
}

fn key_specs(keys: &IndexMap<String, Vec<String>>) -> IndexMap<String, KeyColumns> {
    keys.iter()
        .map(|(name, cols)| (name.clone(), KeyColumns::List(cols.clone())))
        .collect()
}

/// Builder for [`Schema`]
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    basename: String,
    prefix: String,
    columns: IndexMap<String, String>,
    typed_columns: IndexMap<String, Column>,
    primary_key: Option<String>,
    unique_keys: IndexMap<String, Vec<String>>,
    keys: IndexMap<String, Vec<String>>,
    relations: Vec<(RelationType, String, String, String)>,
}

impl SchemaBuilder {
    pub fn new(basename: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            prefix: String::new(),
            columns: IndexMap::new(),
            typed_columns: IndexMap::new(),
            primary_key: None,
            unique_keys: IndexMap::new(),
            keys: IndexMap::new(),
            relations: Vec::new(),
        }
    }

    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Declare a column by its SQL type declaration
    pub fn column(mut self, name: impl Into<String>, declaration: impl Into<String>) -> Self {
        self.columns.insert(name.into(), declaration.into());
        self
    }

    /// Declare a typed column; its index type registers the matching key
    pub fn typed_column(mut self, column: Column) -> Self {
        let name = column.name.clone();
        match column.index {
            Some(IndexType::Primary) => self.primary_key = Some(name.clone()),
            Some(IndexType::Unique) => {
                self.unique_keys.insert(name.clone(), vec![name.clone()]);
            }
            Some(IndexType::Index) => {
                self.keys.insert(name.clone(), vec![name.clone()]);
            }
            None => {}
        }
        self.columns.insert(name.clone(), column.definition());
        self.typed_columns.insert(name, column);
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn unique_key<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_keys
            .insert(name.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn key<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys
            .insert(name.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn relation(
        mut self,
        kind: RelationType,
        column: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations
            .push((kind, column.into(), foreign_table.into(), foreign_key.into()));
        self
    }

    /// Validate and build
    ///
    /// Fails when the basename is empty, when there are no columns, or when
    /// the primary key, a key or a relation names an undeclared column.
    pub fn build(self) -> Result<Schema> {
        if self.basename.trim().is_empty() {
            return Err(Error::schema("Schema needs a table basename"));
        }
        if self.columns.is_empty() {
            return Err(Error::schema(format!(
                "Schema '{}' declares no columns",
                self.basename
            )));
        }
        if let Some(pk) = &self.primary_key {
            if !self.columns.contains_key(pk) {
                return Err(Error::schema(format!(
                    "Primary key '{}' is not a column of '{}'",
                    pk, self.basename
                )));
            }
        }
        for (name, cols) in self.unique_keys.iter().chain(self.keys.iter()) {
            if cols.is_empty() {
                return Err(Error::schema(format!("Key '{}' has no columns", name)));
            }
            if let Some(missing) = cols.iter().find(|c| !self.columns.contains_key(*c)) {
                return Err(Error::schema(format!(
                    "Key '{}' uses unknown column '{}' of '{}'",
                    name, missing, self.basename
                )));
            }
        }

        let mut schema = Schema {
            name: format!("{}{}", self.prefix, self.basename),
            basename: self.basename,
            columns: self.columns,
            typed_columns: self.typed_columns,
            primary_key: self.primary_key,
            unique_keys: self.unique_keys,
            keys: self.keys,
            relations: IndexMap::new(),
        };
        for (kind, column, foreign_table, foreign_key) in &self.relations {
            schema.add_relation(*kind, column, foreign_table, foreign_key)?;
        }
        Ok(schema)
    }
}

/// Serialized schema as found in YAML/TOML definition files
///
/// ```yaml
/// table: posts
/// columns:
///   id: bigint(20) unsigned NOT NULL AUTO_INCREMENT
///   title: varchar(255) NOT NULL
///   status: { type: enum, enum_values: [draft, publish], default: draft }
/// primary_key: id
/// unique_keys:
///   title: title
/// keys:
///   status_title: [status, title]
/// relations:
///   - { type: one_to_many, column: id, foreign_table: postmeta, foreign_key: "%s_id" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(alias = "basename", alias = "table_basename")]
    pub table: String,
    pub columns: IndexMap<String, ColumnSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub unique_keys: IndexMap<String, KeyColumns>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub keys: IndexMap<String, KeyColumns>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationDefinition>,
}

/// A column given either as its declaration or as a typed definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    Declaration(String),
    Typed(Column),
}

/// Key columns given as a list or as a comma-separated string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyColumns {
    List(Vec<String>),
    Joined(String),
}

impl KeyColumns {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            KeyColumns::List(cols) => cols.clone(),
            KeyColumns::Joined(cols) => cols
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDefinition {
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub column: String,
    pub foreign_table: String,
    #[serde(default = "default_foreign_key")]
    pub foreign_key: String,
}

fn default_foreign_key() -> String {
    "%s_id".to_string()
}

impl SchemaDefinition {
    pub fn into_schema(self) -> Result<Schema> {
        let mut builder = Schema::builder(self.table);
        for (name, spec) in self.columns {
            builder = match spec {
                ColumnSpec::Declaration(decl) => builder.column(name, decl),
                ColumnSpec::Typed(mut column) => {
                    column.name = name;
                    builder.typed_column(column)
                }
            };
        }
        if let Some(pk) = self.primary_key {
            builder = builder.primary_key(pk);
        }
        for (name, cols) in self.unique_keys {
            builder = builder.unique_key(name, cols.to_vec());
        }
        for (name, cols) in self.keys {
            builder = builder.key(name, cols.to_vec());
        }
        for rel in self.relations {
            builder = builder.relation(rel.kind, rel.column, rel.foreign_table, rel.foreign_key);
        }
        builder.build()
    }
}
