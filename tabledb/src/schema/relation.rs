//! Relations between tables
//!
//! Relations are bookkeeping only: nothing is enforced by the database, they
//! just tell a caller which rows of another table belong to a row.

use crate::database::types::SqlValue;
use crate::error::{Error, Result};
use crate::query::dialects::SqlDialect;
use crate::query::prepare::format_value;
use crate::query::ColumnFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cardinality of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::OneToOne => "one_to_one",
            RelationType::OneToMany => "one_to_many",
            RelationType::ManyToMany => "many_to_many",
        }
    }
}

impl FromStr for RelationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one_to_one" => Ok(RelationType::OneToOne),
            "one_to_many" => Ok(RelationType::OneToMany),
            "many_to_many" => Ok(RelationType::ManyToMany),
            other => Err(Error::schema(format!("Unknown relation type '{}'", other))),
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relation from a column of the native table to a key of a foreign table
///
/// Table names are basenames; the connection prefix is applied when SQL is
/// generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationType,
    pub native_table: String,
    pub native_key: String,
    pub foreign_table: String,
    pub foreign_key: String,
}

impl Relation {
    /// Create a relation
    ///
    /// A `%s` in `foreign_key` is replaced by the native table basename, so
    /// `"%s_id"` on table `user` becomes `user_id`.
    pub fn new(
        kind: RelationType,
        native_table: impl Into<String>,
        native_key: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_key: &str,
    ) -> Self {
        let native_table = native_table.into();
        let foreign_key = foreign_key.replacen("%s", &native_table, 1);
        Self {
            kind,
            native_table,
            native_key: native_key.into(),
            foreign_table: foreign_table.into(),
            foreign_key,
        }
    }
}

/// A relation seen from one of its two tables
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    relation: Relation,
    is_native: bool,
}

impl Relationship {
    /// Fails when `table` is neither side of the relation
    pub fn new(relation: Relation, table: &str) -> Result<Self> {
        let is_native = table == relation.native_table;
        if !is_native && table != relation.foreign_table {
            return Err(Error::schema(format!(
                "Invalid table '{}' for relation {} -> {}",
                table, relation.native_table, relation.foreign_table
            )));
        }
        Ok(Self {
            relation,
            is_native,
        })
    }

    pub fn kind(&self) -> RelationType {
        self.relation.kind
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub fn is_native(&self) -> bool {
        self.is_native
    }

    pub fn is_foreign(&self) -> bool {
        !self.is_native
    }

    /// Basename and key column of the other side
    pub fn target(&self) -> (&str, &str) {
        if self.is_native {
            (&self.relation.foreign_table, &self.relation.foreign_key)
        } else {
            (&self.relation.native_table, &self.relation.native_key)
        }
    }

    /// Key column on this side
    pub fn own_key(&self) -> &str {
        if self.is_native {
            &self.relation.native_key
        } else {
            &self.relation.foreign_key
        }
    }

    /// `SELECT * FROM <other table> WHERE <other key> = <value>`
    pub fn related_rows_sql(&self, dialect: &dyn SqlDialect, prefix: &str, value: &SqlValue) -> String {
        let (table, key) = self.target();
        format!(
            "SELECT * FROM {}{} WHERE {} = {}",
            prefix,
            table,
            key,
            format_value(dialect, ColumnFormat::String, value)
        )
    }
}
