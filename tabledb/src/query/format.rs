//! Format specifiers: how a value is substituted into a statement

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of a column value, written `%d`, `%f` or `%s`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnFormat {
    /// `%d`: unquoted integer
    Integer,
    /// `%f`: unquoted float, `.` separator, six fractional digits
    Float,
    /// `%s`: escaped, single-quoted string
    String,
}

impl ColumnFormat {
    pub fn placeholder(&self) -> &'static str {
        match self {
            ColumnFormat::Integer => "%d",
            ColumnFormat::Float => "%f",
            ColumnFormat::String => "%s",
        }
    }

    /// Infer the format from a SQL type declaration
    ///
    /// Substring match on the lower-cased declaration: `int` or `time` give
    /// integers, the floating point and fixed point families give floats,
    /// anything else is a string. `time` also matches `datetime` and
    /// `timestamp`.
    pub fn infer(declaration: &str) -> Self {
        let decl = declaration.to_lowercase();
        if decl.contains("int") || decl.contains("time") {
            ColumnFormat::Integer
        } else if ["float", "double", "decimal", "numeric", "real"]
            .iter()
            .any(|t| decl.contains(t))
        {
            ColumnFormat::Float
        } else {
            ColumnFormat::String
        }
    }
}

impl fmt::Display for ColumnFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.placeholder())
    }
}

impl FromStr for ColumnFormat {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "%d" => Ok(ColumnFormat::Integer),
            "%f" | "%F" => Ok(ColumnFormat::Float),
            "%s" => Ok(ColumnFormat::String),
            other => Err(QueryError::InvalidFormat(other.to_string())),
        }
    }
}

/// Caller-supplied formats for the columns of a statement
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Formats {
    /// Look every column up in the schema, `%s` when unknown
    #[default]
    Infer,
    /// One format for every column
    All(ColumnFormat),
    /// Positional formats; columns past the end fall back to inference
    PerColumn(Vec<ColumnFormat>),
}

impl Formats {
    /// Explicit override for the column at `index`, if any
    pub fn explicit(&self, index: usize) -> Option<ColumnFormat> {
        match self {
            Formats::Infer => None,
            Formats::All(format) => Some(*format),
            Formats::PerColumn(formats) => formats.get(index).copied(),
        }
    }

    /// Parse a list of `%d`/`%f`/`%s` strings
    pub fn parse_list<S: AsRef<str>>(formats: &[S]) -> Result<Self, QueryError> {
        formats
            .iter()
            .map(|f| f.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Formats::PerColumn)
    }
}

impl From<ColumnFormat> for Formats {
    fn from(format: ColumnFormat) -> Self {
        Formats::All(format)
    }
}

impl From<Vec<ColumnFormat>> for Formats {
    fn from(formats: Vec<ColumnFormat>) -> Self {
        Formats::PerColumn(formats)
    }
}
