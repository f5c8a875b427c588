//! In-memory sink
//!
//! Keeps appended rows per table. Faults can be injected to reproduce what a
//! remote store does under load: rejecting bulk statements, rejecting
//! particular rows, or dropping the connection after some rows.

use super::{Sink, SinkResult};
use crate::error::SinkError;
use crate::types::Row;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

type RowPredicate = Box<dyn Fn(&Row) -> bool + Send + Sync>;

/// In-memory sink with fault injection
#[derive(Default)]
pub struct MemorySink {
    /// Appended rows per table
    tables: HashMap<String, Vec<Row>>,
    /// Reject every bulk call
    fail_bulk: bool,
    /// Reject the bulk calls at these positions (0-based, in call order)
    fail_bulk_calls: HashSet<usize>,
    /// Rows matching this predicate are rejected (and poison any bulk call carrying them)
    reject_row: Option<RowPredicate>,
    /// Connection drops once this many rows are confirmed
    connection_budget: Option<usize>,
    /// Set once the connection has dropped
    disconnected: bool,
    /// Rows confirmed so far, across tables
    confirmed: usize,
    /// Number of bulk calls received
    bulk_calls: usize,
    /// Number of single-row calls received
    row_calls: usize,
}

impl MemorySink {
    /// Create an always-succeeding sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every bulk append (single-row appends still work)
    #[must_use]
    pub fn failing_bulk(mut self) -> Self {
        self.fail_bulk = true;
        self
    }

    /// Reject the bulk calls at the given positions (0-based, in call order)
    ///
    /// Single-row appends still work, so the rows of a rejected call can be
    /// stored one by one.
    #[must_use]
    pub fn failing_bulk_at(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.fail_bulk_calls.extend(calls);
        self
    }

    /// Reject rows matching `predicate`, in bulk and individually
    #[must_use]
    pub fn rejecting_rows(
        mut self,
        predicate: impl Fn(&Row) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.reject_row = Some(Box::new(predicate));
        self
    }

    /// Drop the connection once a call would take confirmed rows past `rows`
    #[must_use]
    pub fn losing_connection_after(mut self, rows: usize) -> Self {
        self.connection_budget = Some(rows);
        self
    }

    /// Drop the connection now
    pub fn disconnect(&mut self) {
        self.disconnected = true;
    }

    /// Rows stored in `table`
    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map_or(&[], Vec::as_slice)
    }

    /// Total rows confirmed across tables
    pub fn confirmed(&self) -> usize {
        self.confirmed
    }

    /// Number of bulk calls received
    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls
    }

    /// Number of single-row calls received
    pub fn row_calls(&self) -> usize {
        self.row_calls
    }

    fn accept(&mut self, table: &str, rows: &[Row]) -> SinkResult<()> {
        if self.disconnected {
            return Err(SinkError::connection_lost("connection is closed"));
        }
        if let Some(budget) = self.connection_budget {
            if self.confirmed + rows.len() > budget {
                self.disconnected = true;
                return Err(SinkError::connection_lost(format!(
                    "connection dropped after {} rows",
                    self.confirmed
                )));
            }
        }
        if let Some(reject) = &self.reject_row {
            if let Some(pos) = rows.iter().position(|row| reject(row)) {
                return Err(SinkError::statement(format!("row {pos} of batch rejected")));
            }
        }

        self.tables
            .entry(table.to_string())
            .or_default()
            .extend_from_slice(rows);
        self.confirmed += rows.len();
        Ok(())
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn check_connection(&mut self) -> SinkResult<()> {
        if self.disconnected {
            Err(SinkError::connection_lost("connection is closed"))
        } else {
            Ok(())
        }
    }

    async fn bulk_append(
        &mut self,
        table: &str,
        _columns: &[String],
        rows: &[Row],
    ) -> SinkResult<()> {
        let call = self.bulk_calls;
        self.bulk_calls += 1;
        if (self.fail_bulk || self.fail_bulk_calls.contains(&call)) && !self.disconnected {
            return Err(SinkError::statement("bulk insert rejected"));
        }
        self.accept(table, rows)
    }

    async fn append_row(&mut self, table: &str, _columns: &[String], row: &Row) -> SinkResult<()> {
        self.row_calls += 1;
        self.accept(table, std::slice::from_ref(row))
    }
}
