//! Typed column definitions
//!
//! A `Column` renders to the declaration string stored in a [`Schema`] and
//! validates values before they are written.
//!
//! [`Schema`]: super::Schema

use crate::database::types::SqlValue;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column types that can be declared through a `Column`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Int,
    TinyInt,
    BigInt,
    Float,
    Decimal,
    Text,
    LongText,
    Varchar,
    Enum,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Int => "int",
            ColumnKind::TinyInt => "tinyint",
            ColumnKind::BigInt => "bigint",
            ColumnKind::Float => "float",
            ColumnKind::Decimal => "decimal",
            ColumnKind::Text => "text",
            ColumnKind::LongText => "longtext",
            ColumnKind::Varchar => "varchar",
            ColumnKind::Enum => "enum",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnKind::Int
                | ColumnKind::TinyInt
                | ColumnKind::BigInt
                | ColumnKind::Float
                | ColumnKind::Decimal
        )
    }

    /// Types whose length is written `(precision,scale)`
    pub fn is_variable_length(&self) -> bool {
        matches!(self, ColumnKind::Float | ColumnKind::Decimal)
    }
}

impl FromStr for ColumnKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "int" => Ok(ColumnKind::Int),
            "tinyint" => Ok(ColumnKind::TinyInt),
            "bigint" => Ok(ColumnKind::BigInt),
            "float" => Ok(ColumnKind::Float),
            "decimal" => Ok(ColumnKind::Decimal),
            "text" => Ok(ColumnKind::Text),
            "longtext" => Ok(ColumnKind::LongText),
            "varchar" => Ok(ColumnKind::Varchar),
            "enum" => Ok(ColumnKind::Enum),
            other => Err(Error::schema(format!("Unknown column type given - '{}'", other))),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index declared on a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Index,
    Unique,
    Primary,
}

impl FromStr for IndexType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "index" | "key" => Ok(IndexType::Index),
            "unique" => Ok(IndexType::Unique),
            "primary" => Ok(IndexType::Primary),
            other => Err(Error::schema(format!("Unknown index type '{}'", other))),
        }
    }
}

/// Declared length: `(n)` or `(precision,scale)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLength {
    Fixed(u32),
    Scaled(u32, u32),
}

impl fmt::Display for ColumnLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLength::Fixed(n) => write!(f, "{}", n),
            ColumnLength::Scaled(p, s) => write!(f, "{},{}", p, s),
        }
    }
}

/// A typed column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    #[serde(default)]
    pub length: Option<ColumnLength>,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub index: Option<IndexType>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            length: None,
            unsigned: false,
            not_null: false,
            auto_increment: false,
            default: None,
            enum_values: Vec::new(),
            index: None,
        }
    }

    /// Set the length from its textual form: `"255"` or `"10,2"`
    ///
    /// The two-part form is only kept for float and decimal columns; for the
    /// others the first part is used.
    pub fn length(mut self, length: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| Error::schema(format!("Invalid column length '{}'", length)))
        };
        self.length = Some(match length.split_once(',') {
            Some((p, s)) if self.kind.is_variable_length() => {
                ColumnLength::Scaled(parse(p)?, parse(s)?)
            }
            Some((p, _)) => ColumnLength::Fixed(parse(p)?),
            None => ColumnLength::Fixed(parse(length)?),
        });
        Ok(self)
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Auto-increment columns accept null (the database fills them in)
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.not_null = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn index(mut self, index: IndexType) -> Self {
        self.index = Some(index);
        self
    }

    pub fn primary_key(self) -> Self {
        self.index(IndexType::Primary)
    }

    pub fn unique(self) -> Self {
        self.index(IndexType::Unique)
    }

    pub fn is_null_allowed(&self) -> bool {
        !self.not_null
    }

    pub fn max_length(&self) -> Option<u32> {
        match self.length {
            Some(ColumnLength::Fixed(n)) if n > 0 => Some(n),
            _ => None,
        }
    }

    /// SQL type declaration, e.g. `bigint(20) unsigned NOT NULL AUTO_INCREMENT`
    pub fn definition(&self) -> String {
        let mut def = self.kind.as_str().to_string();

        if self.kind == ColumnKind::Enum {
            let values: Vec<String> = self
                .enum_values
                .iter()
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect();
            def.push_str(&format!("({})", values.join(",")));
        } else if let Some(length) = self.length {
            def.push_str(&format!("({})", length));
        }

        if self.unsigned && self.kind.is_numeric() {
            def.push_str(" unsigned");
        }
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            if default.eq_ignore_ascii_case("null") {
                def.push_str(" DEFAULT NULL");
            } else if self.kind.is_numeric() {
                def.push_str(&format!(" DEFAULT {}", default));
            } else {
                def.push_str(&format!(" DEFAULT '{}'", default.replace('\'', "''")));
            }
        }
        if self.auto_increment {
            def.push_str(" AUTO_INCREMENT");
        }

        def
    }

    /// Check a value against the column's constraints
    ///
    /// Enum columns answer `Ok(false)` for values outside the allowed set;
    /// every other violation is an error.
    pub fn validate(&self, value: &SqlValue) -> Result<bool> {
        if value.is_null() {
            return if self.is_null_allowed() {
                Ok(true)
            } else {
                Err(Error::validation(format!(
                    "Column '{}': value cannot be null",
                    self.name
                )))
            };
        }

        if self.kind == ColumnKind::Enum {
            if self.enum_values.is_empty() {
                return Err(Error::validation(format!(
                    "Column '{}': cannot validate enumerated value, no valid values set",
                    self.name
                )));
            }
            let text = value.as_text();
            return Ok(self.enum_values.iter().any(|v| *v == text));
        }

        if self.kind.is_numeric() && !value.is_numeric() {
            return Err(Error::validation(format!(
                "Column '{}': value must be numeric",
                self.name
            )));
        }

        if let Some(max) = self.max_length() {
            if value.as_text().chars().count() > max as usize {
                return Err(Error::validation(format!(
                    "Column '{}': value exceeds maximum allowable length of {}",
                    self.name, max
                )));
            }
        }

        Ok(true)
    }
}
