//! DuckDB-backed sink
//!
//! Loads rows into a DuckDB database file (or an in-memory database).
//! Bulk appends run as one multi-row parameterized `INSERT` inside a
//! transaction, so a rejected chunk leaves nothing behind.

use super::{Sink, SinkResult};
use crate::error::{Error, Result, SinkError};
use crate::types::{Dataset, Row, Value};
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;

/// DuckDB sink
pub struct DuckDbSink {
    /// DuckDB connection
    conn: Connection,
    /// Database location (for logging)
    location: String,
    /// Emulated bound-parameter ceiling per statement
    max_parameters: Option<usize>,
}

impl DuckDbSink {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::config(format!(
                "Failed to open DuckDB database '{}': {e}",
                path.display()
            ))
        })?;

        Ok(Self {
            conn,
            location: path.display().to_string(),
            max_parameters: None,
        })
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;

        Ok(Self {
            conn,
            location: ":memory:".to_string(),
            max_parameters: None,
        })
    }

    /// Reject bulk statements carrying more bound parameters than `limit`
    ///
    /// DuckDB itself has no such ceiling; this reproduces the behavior of
    /// stores that do (SQL Server stops at 2,100).
    #[must_use]
    pub fn with_max_parameters(mut self, limit: Option<usize>) -> Self {
        self.max_parameters = limit;
        self
    }

    /// Database location
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Run one or more SQL statements
    pub fn execute(&self, sql: &str) -> Result<()> {
        tracing::debug!("Executing: {}", sql);
        self.conn
            .execute_batch(sql)
            .map_err(|e| Error::config(format!("Failed to execute SQL: {e}")))
    }

    /// Create `table` if missing, typing columns from the dataset's values
    ///
    /// A column is `DECIMAL(18, 4)` or `TIMESTAMP` when its first non-null
    /// value is of that kind, `VARCHAR` otherwise.
    pub fn ensure_table(&self, table: &str, dataset: &Dataset) -> Result<()> {
        if let Some((schema, _)) = table.rsplit_once('.') {
            self.execute(&format!("CREATE SCHEMA IF NOT EXISTS {};", quote_table(schema)))?;
        }

        let columns: Vec<String> = dataset
            .columns()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let sql_type = dataset
                    .rows()
                    .iter()
                    .map(|row| &row[i])
                    .find(|v| !v.is_null())
                    .map_or("VARCHAR", sql_type_for);
                format!("{} {sql_type}", quote_ident(name))
            })
            .collect();

        self.execute(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            quote_table(table),
            columns.join(", ")
        ))
    }

    /// Number of rows currently in `table`
    pub fn row_count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_table(table)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| Error::config(format!("Failed to count rows in '{table}': {e}")))?;
        Ok(count as usize)
    }

    fn insert(&mut self, table: &str, columns: &[String], rows: &[Row]) -> SinkResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let parameters = columns.len() * rows.len();
        if let Some(limit) = self.max_parameters {
            if parameters > limit {
                return Err(SinkError::statement(format!(
                    "statement carries {parameters} parameters, limit is {limit}"
                )));
            }
        }

        let sql = insert_sql(table, columns, rows);
        let params: Vec<Option<String>> = rows.iter().flatten().map(Value::to_text).collect();

        let tx = self.conn.transaction().map_err(statement_error)?;
        {
            let mut stmt = tx.prepare(&sql).map_err(statement_error)?;
            stmt.execute(duckdb::params_from_iter(params.iter()))
                .map_err(statement_error)?;
        }
        tx.commit().map_err(statement_error)?;
        Ok(())
    }
}

#[async_trait]
impl Sink for DuckDbSink {
    fn name(&self) -> &str {
        &self.location
    }

    async fn check_connection(&mut self) -> SinkResult<()> {
        self.conn
            .execute_batch("SELECT 1")
            .map_err(|e| SinkError::connection_lost(format!("Connection check failed: {e}")))
    }

    async fn bulk_append(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> SinkResult<()> {
        self.insert(table, columns, rows)
    }

    async fn append_row(&mut self, table: &str, columns: &[String], row: &Row) -> SinkResult<()> {
        self.insert(table, columns, std::slice::from_ref(row))
    }

    async fn create_table(&mut self, table: &str, dataset: &Dataset) -> SinkResult<()> {
        self.ensure_table(table, dataset)
            .map_err(|e| SinkError::statement(e.to_string()))
    }
}

fn statement_error(e: duckdb::Error) -> SinkError {
    SinkError::statement(e.to_string())
}

/// SQL type used when creating a column for a value
fn sql_type_for(value: &Value) -> &'static str {
    match value {
        Value::Decimal(_) => "DECIMAL(18, 4)",
        Value::Timestamp(_) => "TIMESTAMP",
        Value::Text(_) | Value::Null => "VARCHAR",
    }
}

/// Quote an identifier, doubling embedded quotes
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified table name
fn quote_table(table: &str) -> String {
    table
        .split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Build a multi-row parameterized INSERT
///
/// Typed values get an explicit cast so the text parameters land in
/// `DECIMAL` and `TIMESTAMP` columns unchanged.
fn insert_sql(table: &str, columns: &[String], rows: &[Row]) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let values = rows
        .iter()
        .map(|row| {
            let placeholders = row
                .iter()
                .map(|value| match value {
                    Value::Decimal(_) => "CAST(? AS DECIMAL(18, 4))",
                    Value::Timestamp(_) => "CAST(? AS TIMESTAMP)",
                    Value::Text(_) | Value::Null => "?",
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({placeholders})")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({column_list}) VALUES {values}",
        quote_table(table)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_quote_table() {
        assert_eq!(quote_table("transactions"), "\"transactions\"");
        assert_eq!(quote_table("vnpay.all_tx"), "\"vnpay\".\"all_tx\"");
        assert_eq!(quote_ident("Số \"tiền\""), "\"Số \"\"tiền\"\"\"");
    }

    #[test]
    fn test_insert_sql() {
        let columns = vec!["id".to_string(), "amount".to_string()];
        let rows = vec![
            vec![Value::text("a"), Value::Decimal(Decimal::new(150, 2))],
            vec![Value::text("b"), Value::Null],
        ];

        assert_eq!(
            insert_sql("tx", &columns, &rows),
            "INSERT INTO \"tx\" (\"id\", \"amount\") VALUES \
             (?, CAST(? AS DECIMAL(18, 4))), (?, ?)"
        );
    }

    #[test]
    fn test_sql_type_for() {
        assert_eq!(sql_type_for(&Value::text("x")), "VARCHAR");
        assert_eq!(sql_type_for(&Value::Decimal(Decimal::ONE)), "DECIMAL(18, 4)");
    }
}
