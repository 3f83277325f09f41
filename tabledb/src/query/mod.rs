//! SQL text generation
//!
//! Statements are rendered to literal, escaped SQL: `prepare` substitutes
//! values into a template through the connection's dialect and the builders
//! in [`statement`] and [`ddl`] produce the templates from schemas and data.
//! Nothing here talks to a database.

pub mod ddl;
pub mod dialects;
pub mod format;
pub mod prepare;
pub mod statement;

pub use ddl::DdlWriter;
pub use dialects::{create_dialect, SqlDialect};
pub use format::{ColumnFormat, Formats};
pub use prepare::{format_value, placeholder_count, prepare};
pub use statement::StatementBuilder;

// Re-export QueryError next to the code raising it
pub use crate::error::QueryError;
