//! Per-connection query and error logs
//!
//! A `Connection` keeps every failed statement in an [`ErrorLog`] for the
//! lifetime of the handle and, when `save_queries` is enabled, every executed
//! statement with its timing in a [`QueryLog`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// A failed statement and the message the driver returned for it
#[derive(Debug, Clone, Serialize)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub message: String,
}

/// Accumulated error log for one connection
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorLog {
    entries: Vec<ErrorLogEntry>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, query: impl Into<String>, message: impl Into<String>) {
        self.entries.push(ErrorLogEntry {
            timestamp: Utc::now(),
            query: query.into(),
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[ErrorLogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ErrorLogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// An executed statement with how long the driver took
#[derive(Debug, Clone, Serialize)]
pub struct QueryLogEntry {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

/// Saved statements, only filled when `save_queries` is on
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryLog {
    entries: Vec<QueryLogEntry>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, query: impl Into<String>, elapsed: Duration) {
        self.entries.push(QueryLogEntry {
            timestamp: Utc::now(),
            query: query.into(),
            elapsed,
        });
    }

    pub fn entries(&self) -> &[QueryLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total time spent in the driver across all saved statements
    pub fn total_elapsed(&self) -> Duration {
        self.entries.iter().map(|e| e.elapsed).sum()
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_log_keeps_insertion_order() {
        let mut log = ErrorLog::new();
        log.record("SELECT * FROM missing", "no such table: missing");
        log.record("DELETE FROM t", "no such table: t");

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].query, "SELECT * FROM missing");
        assert_eq!(log.last().unwrap().message, "no such table: t");
    }

    #[test]
    fn query_log_sums_elapsed() {
        let mut log = QueryLog::new();
        log.record("SELECT 1", Duration::from_millis(3));
        log.record("SELECT 2", Duration::from_millis(7));
        assert_eq!(log.total_elapsed(), Duration::from_millis(10));

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["entries"][1]["query"], "SELECT 2");
    }
}
