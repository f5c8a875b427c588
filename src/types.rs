//! Common types used throughout txload
//!
//! A [`Dataset`] is the unit the loader works on: ordered column names,
//! ordered rows of typed [`Value`]s, and the provenance tag of the file the
//! rows came from. A [`Chunk`] is a borrowed, contiguous slice of a dataset.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format used whenever a timestamp is rendered as text
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Values
// ============================================================================

/// A single typed cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Free text
    Text(String),
    /// Exact decimal (amounts, rates)
    Decimal(Decimal),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Missing value
    Null,
}

impl Value {
    /// Create a text value
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render the value as text, `None` for null
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Decimal(d) => Some(d.to_string()),
            Self::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
            Self::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

/// One row, positionally aligned with [`Dataset::columns`]
pub type Row = Vec<Value>;

// ============================================================================
// Dataset
// ============================================================================

/// An ordered, column-consistent table of typed rows
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
    source: String,
}

impl Dataset {
    /// Create a dataset, checking that every row matches the column count
    pub fn new(source: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let source = source.into();
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::preparation(
                source,
                format!(
                    "row {index} has {} values, expected {}",
                    row.len(),
                    columns.len()
                ),
            ));
        }

        Ok(Self {
            columns,
            rows,
            source,
        })
    }

    /// Create an empty dataset with the given columns
    pub fn empty(source: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            source: source.into(),
        }
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in insertion order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Provenance tag (originating file)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split into consecutive chunks of `size` rows (the last may be shorter)
    ///
    /// A `size` of zero is treated as one.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = Chunk<'_>> {
        let size = size.max(1);
        self.rows.chunks(size).enumerate().map(move |(i, rows)| Chunk {
            offset: i * size,
            rows,
        })
    }
}

// ============================================================================
// Chunk
// ============================================================================

/// A contiguous run of rows submitted as one bulk transmission
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Index of the first row in the original dataset
    pub offset: usize,
    /// The rows of this chunk
    pub rows: &'a [Row],
}

impl<'a> Chunk<'a> {
    /// Number of rows in the chunk
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the chunk is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows paired with their original dataset index
    pub fn indexed_rows(&self) -> impl Iterator<Item = (usize, &'a Row)> + 'a {
        let offset = self.offset;
        self.rows.iter().enumerate().map(move |(i, row)| (offset + i, row))
    }
}
