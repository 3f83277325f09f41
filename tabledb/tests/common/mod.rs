#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tabledb::database::{DatabaseAdapter, QueryResult};
use tabledb::{Connection, DatabaseBackend, DatabaseConfig, Error, Result, Row, Schema};

/// Adapter that records every statement and replays scripted result sets
#[derive(Clone)]
pub struct MockAdapter {
    backend: DatabaseBackend,
    executed: Arc<Mutex<Vec<String>>>,
    results: Arc<Mutex<VecDeque<Vec<Row>>>>,
    fail_on: Arc<Mutex<Option<String>>>,
    next_id: Arc<AtomicI64>,
}

impl MockAdapter {
    pub fn new(backend: DatabaseBackend) -> Self {
        Self {
            backend,
            executed: Arc::new(Mutex::new(Vec::new())),
            results: Arc::new(Mutex::new(VecDeque::new())),
            fail_on: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.executed.lock().unwrap().last().cloned()
    }

    /// Queue the rows returned by the next read
    pub fn push_rows(&self, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        self.results.lock().unwrap().push_back(rows);
    }

    /// Fail every statement containing `needle`
    pub fn fail_on(&self, needle: &str) {
        *self.fail_on.lock().unwrap() = Some(needle.to_string());
    }

    fn run(&self, sql: &str) -> Result<()> {
        self.executed.lock().unwrap().push(sql.to_string());
        match self.fail_on.lock().unwrap().as_deref() {
            Some(needle) if sql.contains(needle) => {
                Err(Error::database_query(format!("mock failure: {}", sql)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DatabaseAdapter for MockAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.run(sql)?;
        Ok(QueryResult {
            rows_affected: 1,
            last_insert_id: Some(self.next_id.fetch_add(1, Ordering::SeqCst)),
        })
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>> {
        self.run(sql)?;
        Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }
}

pub fn mock_connection(backend: DatabaseBackend, prefix: &str) -> (Connection, MockAdapter) {
    let mock = MockAdapter::new(backend);
    let config = DatabaseConfig::builder()
        .url(format!("{}://mock", backend))
        .table_prefix(prefix)
        .save_queries(true)
        .build()
        .unwrap();
    let connection = Connection::with_adapter("mock", Box::new(mock.clone()), config).unwrap();
    (connection, mock)
}

pub fn posts_schema() -> Schema {
    Schema::builder("posts")
        .column("id", "bigint(20) unsigned NOT NULL AUTO_INCREMENT")
        .column("title", "varchar(255) NOT NULL")
        .column("price", "decimal(10,2)")
        .column("author_id", "int(11)")
        .primary_key("id")
        .key("author", ["author_id"])
        .build()
        .unwrap()
}
