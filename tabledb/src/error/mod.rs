use thiserror::Error;

pub mod logging;

pub type Result<T> = std::result::Result<T, Error>;

// Re-export logging types for easy access
pub use logging::{ErrorLog, ErrorLogEntry, QueryLog, QueryLogEntry};

/// Errors raised while turning templates and data into SQL text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("No query template was given")]
    MissingTemplate,

    #[error("Query template expects {expected} arguments, {given} given")]
    ArgumentCount { expected: usize, given: usize },

    #[error("Invalid format specifier '{0}'")]
    InvalidFormat(String),

    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    #[error("Feature not supported in {backend}: {feature}")]
    UnsupportedFeature { backend: String, feature: String },
}

/// Main error type for tabledb
#[derive(Error, Debug)]
pub enum Error {
    #[error("Query build error: {0}")]
    Query(#[from] QueryError),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid table prefix '{0}': only letters, digits and underscores are allowed")]
    InvalidPrefix(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Database-specific errors
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database query error: {0}")]
    DatabaseQuery(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn unknown_table(name: impl Into<String>) -> Self {
        Self::UnknownTable(name.into())
    }

    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    // Database error constructors
    pub fn database_connection(msg: impl Into<String>) -> Self {
        Self::DatabaseConnection(msg.into())
    }

    pub fn database_query(msg: impl Into<String>) -> Self {
        Self::DatabaseQuery(msg.into())
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if the error came back from the database rather than from statement building
    pub fn is_database_error(&self) -> bool {
        match self {
            Error::DatabaseConnection(_) | Error::DatabaseQuery(_) => true,
            Error::WithContext { source, .. } => source.is_database_error(),
            _ => false,
        }
    }

    /// Get a stable error code, useful for CLI exit reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Query(QueryError::MissingTemplate) => "E_MISSING_TEMPLATE",
            Error::Query(QueryError::ArgumentCount { .. }) => "E_ARGUMENT_COUNT",
            Error::Query(QueryError::InvalidFormat(_)) => "E_INVALID_FORMAT",
            Error::Query(QueryError::InvalidStatement(_)) => "E_INVALID_STATEMENT",
            Error::Query(QueryError::UnsupportedFeature { .. }) => "E_UNSUPPORTED",
            Error::Schema(_) => "E_SCHEMA",
            Error::UnknownTable(_) => "E_UNKNOWN_TABLE",
            Error::UnknownColumn { .. } => "E_UNKNOWN_COLUMN",
            Error::InvalidPrefix(_) => "E_INVALID_PREFIX",
            Error::Validation(_) => "E_VALIDATION",
            Error::Config(_) => "E_CONFIG",
            Error::DatabaseConnection(_) => "E_DB_CONNECTION",
            Error::DatabaseQuery(_) => "E_DB_QUERY",
            Error::Json(_) => "E_JSON",
            Error::Yaml(_) => "E_YAML",
            Error::Toml(_) => "E_TOML",
            Error::Io(_) => "E_IO",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_errors_convert_and_keep_their_code() {
        let err: Error = QueryError::ArgumentCount {
            expected: 2,
            given: 1,
        }
        .into();
        assert_eq!(err.error_code(), "E_ARGUMENT_COUNT");
        assert_eq!(
            err.to_string(),
            "Query build error: Query template expects 2 arguments, 1 given"
        );
    }

    #[test]
    fn context_wraps_source_code() {
        let err = Error::database_query("no such table: wp_posts").with_context("loading posts");
        assert_eq!(err.error_code(), "E_DB_QUERY");
        assert!(err.is_database_error());
        assert_eq!(err.to_string(), "loading posts");
    }
}
