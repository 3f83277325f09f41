//! A database connection with per-query state
//!
//! `Connection` owns a driver adapter, the dialect matching its backend, the
//! table prefix and the schemas registered on it. Every statement goes
//! through [`Connection::query`], which records the last query, its result
//! rows or affected row count, the insert id and any error.
//!
//! ```no_run
//! use tabledb::{record, Connection, DatabaseConfig, Formats, Schema};
//!
//! # async fn demo() -> tabledb::Result<()> {
//! let mut db = Connection::connect("main", DatabaseConfig::new("sqlite::memory:")).await?;
//! db.register_schema(
//!     Schema::builder("notes")
//!         .column("id", "INTEGER NOT NULL")
//!         .column("body", "TEXT")
//!         .primary_key("id")
//!         .build()?,
//! );
//! db.create_table("notes").await?;
//! db.insert("notes", &record! { "id" => 1, "body" => "hello" }, &Formats::Infer).await?;
//! let body = db.get_var(Some("SELECT body FROM notes"), 0, 0).await?;
//! # Ok(())
//! # }
//! ```

use crate::database::adapter::{connect_adapter, DatabaseAdapter};
use crate::database::config::DatabaseConfig;
use crate::database::information_schema::{InformationSchema, IntrospectionCache};
use crate::database::types::{DatabaseBackend, Record, Row, SqlValue};
use crate::error::{Error, ErrorLog, QueryLog, Result};
use crate::query::ddl::DdlWriter;
use crate::query::dialects::{create_dialect, SqlDialect};
use crate::query::format::Formats;
use crate::query::prepare;
use crate::query::statement::StatementBuilder;
use crate::schema::Schema;
use crate::table::Table;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Instant;

/// How a statement is executed and what `query` returns for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `CREATE`, `ALTER`, `TRUNCATE`, `DROP`: returns 0
    Definition,
    /// `INSERT`, `DELETE`, `UPDATE`, `REPLACE`: returns rows affected
    Modification { inserts: bool },
    /// Everything else: rows are fetched, returns the row count
    Read,
}

impl StatementKind {
    /// Classify a statement by its leading keyword
    pub fn classify(sql: &str) -> Self {
        let sql = sql.trim_start();
        let keyword_end = sql.find(char::is_whitespace).unwrap_or(sql.len());
        // a keyword alone is not a statement
        if keyword_end == sql.len() {
            return StatementKind::Read;
        }
        match sql[..keyword_end].to_ascii_lowercase().as_str() {
            "create" | "alter" | "truncate" | "drop" => StatementKind::Definition,
            "insert" | "replace" => StatementKind::Modification { inserts: true },
            "delete" | "update" => StatementKind::Modification { inserts: false },
            _ => StatementKind::Read,
        }
    }
}

/// Outcome of [`Connection::create_table`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStatus {
    AlreadyInstalled,
    Created,
    Failed,
}

/// Outcome of [`Connection::drop_table`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropStatus {
    NotInstalled,
    Dropped,
    Failed,
}

impl fmt::Display for CreateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CreateStatus::AlreadyInstalled => "already installed",
            CreateStatus::Created => "created",
            CreateStatus::Failed => "failed",
        })
    }
}

impl fmt::Display for DropStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DropStatus::NotInstalled => "not installed",
            DropStatus::Dropped => "dropped",
            DropStatus::Failed => "failed",
        })
    }
}

/// State of the last statement, reset before every query
#[derive(Debug, Default, Clone)]
struct QueryState {
    last_query: Option<String>,
    last_result: Vec<Row>,
    last_error: Option<String>,
    rows_affected: u64,
    num_rows: usize,
}

/// A database connection with its registered schemas
pub struct Connection {
    name: String,
    adapter: Box<dyn DatabaseAdapter>,
    dialect: Box<dyn SqlDialect>,
    config: DatabaseConfig,
    prefix: String,
    schemas: IndexMap<String, Schema>,
    state: QueryState,
    insert_id: Option<i64>,
    num_queries: usize,
    errors: ErrorLog,
    queries: QueryLog,
    show_errors: bool,
    suppress_errors: bool,
    pub(crate) introspection: IntrospectionCache,
}

impl Connection {
    /// Connect using the backend named by the URL scheme of `config`
    pub async fn connect(name: impl Into<String>, config: DatabaseConfig) -> Result<Self> {
        let name = name.into();
        let adapter = connect_adapter(&name, &config).await?;
        Self::with_adapter(name, adapter, config)
    }

    /// Wrap an already connected adapter
    pub fn with_adapter(
        name: impl Into<String>,
        adapter: Box<dyn DatabaseAdapter>,
        config: DatabaseConfig,
    ) -> Result<Self> {
        validate_prefix(&config.table_prefix)?;
        let dialect = create_dialect(adapter.backend());

        Ok(Self {
            name: name.into(),
            prefix: config.table_prefix.clone(),
            show_errors: config.show_errors,
            suppress_errors: config.suppress_errors,
            adapter,
            dialect,
            config,
            schemas: IndexMap::new(),
            state: QueryState::default(),
            insert_id: None,
            num_queries: 0,
            errors: ErrorLog::new(),
            queries: QueryLog::new(),
            introspection: IntrospectionCache::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.adapter.backend()
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn adapter(&self) -> &dyn DatabaseAdapter {
        self.adapter.as_ref()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub async fn ping(&self) -> Result<bool> {
        self.adapter.ping().await
    }

    // ---- prefix and schemas ----

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Change the table prefix and rename every registered schema
    ///
    /// Only letters, digits and underscores are accepted. Returns the
    /// previous prefix.
    pub fn set_prefix(&mut self, prefix: &str) -> Result<String> {
        validate_prefix(prefix)?;
        let previous = std::mem::replace(&mut self.prefix, prefix.to_string());
        for schema in self.schemas.values_mut() {
            schema.set_table_prefix(prefix);
        }
        self.introspection.clear();
        log::debug!(
            "Database '{}': table prefix '{}' -> '{}'",
            self.name,
            previous,
            prefix
        );
        Ok(previous)
    }

    /// Prefixed name of a registered basename; other names are returned as is
    pub fn filter_table_name(&self, table: &str) -> String {
        if self.schemas.contains_key(table) {
            format!("{}{}", self.prefix, table)
        } else {
            table.to_string()
        }
    }

    /// Register a schema under its basename, applying the current prefix
    pub fn register_schema(&mut self, mut schema: Schema) -> &Schema {
        schema.set_table_prefix(&self.prefix);
        let basename = schema.basename().to_string();
        log::debug!(
            "Database '{}': registered table {} ({})",
            self.name,
            basename,
            schema.name()
        );
        self.schemas.insert(basename.clone(), schema);
        &self.schemas[&basename]
    }

    /// Registered schema by basename or prefixed name
    pub fn schema(&self, table: &str) -> Option<&Schema> {
        self.schemas
            .get(table)
            .or_else(|| self.schemas.values().find(|s| s.name() == table))
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Facade over a registered table
    pub fn table(&mut self, table: &str) -> Result<Table<'_>> {
        let basename = self
            .schema(table)
            .map(|s| s.basename().to_string())
            .ok_or_else(|| Error::unknown_table(table))?;
        Ok(Table::new(self, basename))
    }

    /// Basename → prefixed name of every registered table
    pub fn table_names(&self) -> IndexMap<String, String> {
        self.schemas
            .values()
            .map(|s| (s.basename().to_string(), s.name().to_string()))
            .collect()
    }

    /// Whether `table` is the prefixed name of a registered table
    pub fn is_valid_table(&self, table: &str) -> bool {
        self.schemas.values().any(|s| s.name() == table)
    }

    // ---- execution ----

    /// Reset the per-query state
    pub fn flush(&mut self) {
        self.state = QueryState::default();
    }

    /// Execute one statement
    ///
    /// Returns 0 for definitions, the affected row count for modifications
    /// and the number of fetched rows otherwise. Failures are recorded in the
    /// error log before being returned.
    pub async fn query(&mut self, sql: &str) -> Result<u64> {
        self.flush();
        self.state.last_query = Some(sql.to_string());

        let kind = StatementKind::classify(sql);
        let started = Instant::now();

        let outcome = match kind {
            StatementKind::Definition => self.adapter.execute(sql).await.map(|_| 0),
            StatementKind::Modification { inserts } => {
                self.adapter.execute(sql).await.map(|result| {
                    self.state.rows_affected = result.rows_affected;
                    if inserts {
                        self.insert_id = result.last_insert_id;
                    }
                    result.rows_affected
                })
            }
            StatementKind::Read => self.adapter.fetch_all(sql).await.map(|rows| {
                self.state.num_rows = rows.len();
                self.state.last_result = rows;
                self.state.num_rows as u64
            }),
        };

        self.num_queries += 1;
        if self.config.save_queries {
            self.queries.record(sql, started.elapsed());
        }

        outcome.map_err(|error| {
            if matches!(kind, StatementKind::Modification { inserts: true }) {
                self.insert_id = None;
            }
            self.record_error(sql, &error);
            error
        })
    }

    fn record_error(&mut self, sql: &str, error: &Error) {
        let message = error.to_string();
        self.errors.record(sql, message.clone());
        if self.show_errors && !self.suppress_errors {
            log::error!("Database '{}' error {} for query {}", self.name, message, sql);
        }
        self.state.last_error = Some(message);
    }

    /// Run `sql` and hand back its rows
    pub(crate) async fn fetch_rows(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.query(sql).await?;
        Ok(self.state.last_result.clone())
    }

    async fn run_optional(&mut self, query: Option<&str>) -> Result<()> {
        if let Some(sql) = query {
            self.query(sql).await?;
        }
        Ok(())
    }

    /// One value of a result set
    ///
    /// Runs `query` when given, otherwise reads the previous result. Column
    /// `x` of row `y`, both from 0; `None` when absent, null or empty.
    pub async fn get_var(&mut self, query: Option<&str>, x: usize, y: usize) -> Result<Option<SqlValue>> {
        self.run_optional(query).await?;
        Ok(self.var_at(x, y))
    }

    fn var_at(&self, x: usize, y: usize) -> Option<SqlValue> {
        let value = self.state.last_result.get(y)?.values().nth(x)?;
        match value {
            JsonValue::Null => None,
            JsonValue::String(s) if s.is_empty() => None,
            other => Some(SqlValue::from_json(other)),
        }
    }

    /// Row `y` of a result set
    pub async fn get_row(&mut self, query: Option<&str>, y: usize) -> Result<Option<Row>> {
        self.run_optional(query).await?;
        Ok(self.state.last_result.get(y).cloned())
    }

    /// Column `x` of every row of a result set
    pub async fn get_col(&mut self, query: Option<&str>, x: usize) -> Result<Vec<Option<SqlValue>>> {
        self.run_optional(query).await?;
        Ok((0..self.state.last_result.len())
            .map(|y| self.var_at(x, y))
            .collect())
    }

    /// Every row of a result set
    pub async fn get_results(&mut self, query: Option<&str>) -> Result<Vec<Row>> {
        self.run_optional(query).await?;
        Ok(self.state.last_result.clone())
    }

    /// Rows keyed by the text of their first column; later duplicates are dropped
    pub async fn get_results_keyed(&mut self, query: Option<&str>) -> Result<IndexMap<String, Row>> {
        self.run_optional(query).await?;
        let mut keyed = IndexMap::new();
        for row in &self.state.last_result {
            let key = row
                .values()
                .next()
                .map(|v| SqlValue::from_json(v).as_text())
                .unwrap_or_default();
            keyed.entry(key).or_insert_with(|| row.clone());
        }
        Ok(keyed)
    }

    // ---- statement builders ----

    /// Substitute `args` into `template` with this connection's escaping
    pub fn prepare(&self, template: &str, args: &[SqlValue]) -> Result<String> {
        Ok(prepare::prepare(self.dialect(), template, args)?)
    }

    fn builder_for(&self, table: &str) -> (String, StatementBuilder<'_>) {
        let schema = self.schema(table);
        let name = schema
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| self.filter_table_name(table));
        (name, StatementBuilder::new(self.dialect()).with_schema(schema))
    }

    pub async fn insert(&mut self, table: &str, data: &Record, formats: &Formats) -> Result<u64> {
        let sql = {
            let (name, builder) = self.builder_for(table);
            builder.insert(&name, data, formats)?
        };
        self.query(&sql).await
    }

    pub async fn replace(&mut self, table: &str, data: &Record, formats: &Formats) -> Result<u64> {
        let sql = {
            let (name, builder) = self.builder_for(table);
            builder.replace(&name, data, formats)?
        };
        self.query(&sql).await
    }

    pub async fn update(
        &mut self,
        table: &str,
        data: &Record,
        conditions: &Record,
        formats: &Formats,
        where_formats: &Formats,
    ) -> Result<u64> {
        let sql = {
            let (name, builder) = self.builder_for(table);
            builder.update(&name, data, conditions, formats, where_formats)?
        };
        self.query(&sql).await
    }

    /// Update a single column of the rows matching `conditions`
    pub async fn update_field(
        &mut self,
        table: &str,
        column: &str,
        value: impl Into<SqlValue>,
        conditions: &Record,
    ) -> Result<u64> {
        let mut data = Record::new();
        data.insert(column.to_string(), value.into());
        self.update(table, &data, conditions, &Formats::Infer, &Formats::Infer)
            .await
    }

    pub async fn delete(&mut self, table: &str, conditions: &Record, where_formats: &Formats) -> Result<u64> {
        let sql = {
            let (name, builder) = self.builder_for(table);
            builder.delete(&name, conditions, where_formats)?
        };
        self.query(&sql).await
    }

    /// Run a SELECT over `table` and return its rows
    pub async fn select(
        &mut self,
        table: &str,
        columns: &[&str],
        conditions: &Record,
        where_formats: &Formats,
    ) -> Result<Vec<Row>> {
        let sql = {
            let (name, builder) = self.builder_for(table);
            builder.select(&name, columns, conditions, where_formats)?
        };
        self.fetch_rows(&sql).await
    }

    // ---- tables ----

    /// Introspection with a per-connection cache
    pub fn information_schema(&mut self) -> InformationSchema<'_> {
        InformationSchema::new(self)
    }

    /// Names of the tables installed in the database
    pub async fn installed_tables(&mut self) -> Result<Vec<String>> {
        self.information_schema().tables(true).await
    }

    /// Whether a table is installed; registered basenames are prefixed first
    pub async fn table_exists(&mut self, table: &str) -> Result<bool> {
        let name = self.filter_table_name(table);
        Ok(self.installed_tables().await?.iter().any(|t| *t == name))
    }

    /// `DEFAULT CHARACTER SET … COLLATE …` for MySQL-family backends
    pub fn charset_collate(&self) -> String {
        self.dialect
            .table_options(self.config.charset.as_deref(), self.config.collate.as_deref())
            .trim()
            .to_string()
    }

    fn registered(&self, table: &str) -> Result<Schema> {
        self.schema(table)
            .cloned()
            .ok_or_else(|| Error::unknown_table(table))
    }

    /// Create a registered table unless it is already installed
    pub async fn create_table(&mut self, table: &str) -> Result<CreateStatus> {
        let schema = self.registered(table)?;
        if self.table_exists(schema.basename()).await? {
            return Ok(CreateStatus::AlreadyInstalled);
        }

        let statements = DdlWriter::new(self.dialect())
            .charset(self.config.charset.as_deref())
            .collate(self.config.collate.as_deref())
            .create_table_statements(&schema);
        for (i, sql) in statements.iter().enumerate() {
            if self.query(sql).await.is_err() {
                if i > 0 {
                    self.discard_partial_table(&schema).await;
                }
                return Ok(CreateStatus::Failed);
            }
        }

        Ok(if self.table_exists(schema.basename()).await? {
            log::info!("Database '{}': created table {}", self.name, schema.name());
            CreateStatus::Created
        } else {
            CreateStatus::Failed
        })
    }

    /// Drop a table whose indexes could not all be created
    ///
    /// Runs outside the query state so `last_error` still names the failed
    /// statement.
    async fn discard_partial_table(&mut self, schema: &Schema) {
        let sql = DdlWriter::new(self.dialect()).drop_table(schema);
        match self.adapter.execute(&sql).await {
            Ok(_) => log::warn!(
                "Database '{}': dropped {} after an index failed",
                self.name,
                schema.name()
            ),
            Err(e) => log::error!(
                "Database '{}': {} left without its indexes: {}",
                self.name,
                schema.name(),
                e
            ),
        }
        self.introspection.clear();
    }

    /// Drop a registered table if it is installed
    pub async fn drop_table(&mut self, table: &str) -> Result<DropStatus> {
        let schema = self.registered(table)?;
        if !self.table_exists(schema.basename()).await? {
            return Ok(DropStatus::NotInstalled);
        }

        let sql = DdlWriter::new(self.dialect()).drop_table(&schema);
        if self.query(&sql).await.is_err() {
            return Ok(DropStatus::Failed);
        }

        Ok(if self.table_exists(schema.basename()).await? {
            DropStatus::Failed
        } else {
            log::info!("Database '{}': dropped table {}", self.name, schema.name());
            DropStatus::Dropped
        })
    }

    // ---- state ----

    pub fn last_query(&self) -> Option<&str> {
        self.state.last_query.as_deref()
    }

    pub fn last_result(&self) -> &[Row] {
        &self.state.last_result
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error.as_deref()
    }

    pub fn rows_affected(&self) -> u64 {
        self.state.rows_affected
    }

    pub fn num_rows(&self) -> usize {
        self.state.num_rows
    }

    /// Id generated by the last successful INSERT or REPLACE
    pub fn insert_id(&self) -> Option<i64> {
        self.insert_id
    }

    pub fn num_queries(&self) -> usize {
        self.num_queries
    }

    /// Executed statements with their timings, kept when `save_queries` is set
    pub fn saved_queries(&self) -> &QueryLog {
        &self.queries
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.errors
    }

    /// Returns the previous value
    pub fn show_errors(&mut self, show: bool) -> bool {
        std::mem::replace(&mut self.show_errors, show)
    }

    /// Returns the previous value
    pub fn suppress_errors(&mut self, suppress: bool) -> bool {
        std::mem::replace(&mut self.suppress_errors, suppress)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("backend", &self.backend())
            .field("prefix", &self.prefix)
            .field("tables", &self.schemas.keys().collect::<Vec<_>>())
            .field("num_queries", &self.num_queries)
            .finish()
    }
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(Error::InvalidPrefix(prefix.to_string()))
    }
}
