//! Destination sink module
//!
//! A sink is the relational store rows are loaded into. The loader only
//! relies on the [`Sink`] trait:
//! - `bulk_append` - all-or-nothing append of many rows in one call
//! - `append_row` - append of exactly one row
//! - `check_connection` - cheap liveness probe
//! - `create_table` - optional; stores without DDL keep the default no-op
//!
//! Failures come back as [`SinkError`] values, never as panics, so the
//! loader can decide between row-level fallback and abandoning a dataset.
//!
//! # Implementations
//!
//! - [`DuckDbSink`] - DuckDB database file or in-memory database
//! - [`MemorySink`] - in-memory tables with fault injection (dry runs, tests)

mod database;
mod memory;

pub use database::DuckDbSink;
pub use memory::MemorySink;

use crate::error::SinkError;
use crate::types::{Dataset, Row};
use async_trait::async_trait;

/// Result of one sink call
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// A relational store that accepts ordered column-value tuples
#[async_trait]
pub trait Sink: Send {
    /// Human readable identifier (for logging)
    fn name(&self) -> &str;

    /// Probe whether the store is reachable
    async fn check_connection(&mut self) -> SinkResult<()>;

    /// Append all `rows` to `table`, or none of them
    async fn bulk_append(&mut self, table: &str, columns: &[String], rows: &[Row])
        -> SinkResult<()>;

    /// Append a single row to `table`
    async fn append_row(&mut self, table: &str, columns: &[String], row: &Row) -> SinkResult<()>;

    /// Create `table` for rows shaped like `dataset` if it does not exist
    async fn create_table(&mut self, _table: &str, _dataset: &Dataset) -> SinkResult<()> {
        Ok(())
    }
}
