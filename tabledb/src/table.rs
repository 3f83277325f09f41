//! Table facade
//!
//! A [`Table`] binds one registered schema to its connection so statements
//! can be issued without repeating the table name.

use crate::database::connection::Connection;
use crate::database::types::{Record, Row, SqlValue};
use crate::error::{Error, Result};
use crate::query::Formats;
use crate::schema::Schema;

/// A registered table on a borrowed connection
pub struct Table<'c> {
    connection: &'c mut Connection,
    basename: String,
}

impl<'c> Table<'c> {
    pub(crate) fn new(connection: &'c mut Connection, basename: String) -> Self {
        Self {
            connection,
            basename,
        }
    }

    pub fn schema(&self) -> Result<&Schema> {
        self.connection
            .schema(&self.basename)
            .ok_or_else(|| Error::unknown_table(self.basename.as_str()))
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut *self.connection
    }

    pub async fn insert(&mut self, data: &Record, formats: &Formats) -> Result<u64> {
        self.connection.insert(&self.basename, data, formats).await
    }

    pub async fn replace(&mut self, data: &Record, formats: &Formats) -> Result<u64> {
        self.connection.replace(&self.basename, data, formats).await
    }

    pub async fn update(
        &mut self,
        data: &Record,
        conditions: &Record,
        formats: &Formats,
        where_formats: &Formats,
    ) -> Result<u64> {
        self.connection
            .update(&self.basename, data, conditions, formats, where_formats)
            .await
    }

    pub async fn update_field(
        &mut self,
        column: &str,
        value: impl Into<SqlValue>,
        conditions: &Record,
    ) -> Result<u64> {
        self.connection
            .update_field(&self.basename, column, value, conditions)
            .await
    }

    pub async fn delete(&mut self, conditions: &Record, where_formats: &Formats) -> Result<u64> {
        self.connection
            .delete(&self.basename, conditions, where_formats)
            .await
    }

    pub async fn select(&mut self, columns: &[&str], conditions: &Record) -> Result<Vec<Row>> {
        self.connection
            .select(&self.basename, columns, conditions, &Formats::Infer)
            .await
    }

    pub fn prepare(&self, template: &str, args: &[SqlValue]) -> Result<String> {
        self.connection.prepare(template, args)
    }

    pub async fn query(&mut self, sql: &str) -> Result<u64> {
        self.connection.query(sql).await
    }

    pub async fn get_var(&mut self, query: Option<&str>, x: usize, y: usize) -> Result<Option<SqlValue>> {
        self.connection.get_var(query, x, y).await
    }

    pub async fn get_row(&mut self, query: Option<&str>, y: usize) -> Result<Option<Row>> {
        self.connection.get_row(query, y).await
    }

    pub async fn get_col(&mut self, query: Option<&str>, x: usize) -> Result<Vec<Option<SqlValue>>> {
        self.connection.get_col(query, x).await
    }

    pub async fn get_results(&mut self, query: Option<&str>) -> Result<Vec<Row>> {
        self.connection.get_results(query).await
    }
}
