//! Loader types
//!
//! Configuration, per-chunk outcomes and the report returned by an upload.

use crate::recovery::RecoveryArtifact;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the bulk loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Timeout for one transmission call in milliseconds (0 = no timeout)
    ///
    /// The timeout can only fire at an await point inside the sink call.
    /// [`DuckDbSink`](crate::sink::DuckDbSink) does its work synchronously,
    /// so this bounds sinks that talk to a remote store asynchronously.
    #[serde(default = "default_transmit_timeout_ms")]
    pub transmit_timeout_ms: u64,

    /// Report progress whenever completion advanced this many percentage points
    #[serde(default = "default_progress_step_percent")]
    pub progress_step_percent: f64,

    /// Report progress whenever processed rows cross a multiple of this (0 = off)
    #[serde(default = "default_progress_row_interval")]
    pub progress_row_interval: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            transmit_timeout_ms: default_transmit_timeout_ms(),
            progress_step_percent: default_progress_step_percent(),
            progress_row_interval: default_progress_row_interval(),
        }
    }
}

fn default_transmit_timeout_ms() -> u64 {
    60_000
}

fn default_progress_step_percent() -> f64 {
    2.0
}

fn default_progress_row_interval() -> usize {
    10_000
}

impl LoaderConfig {
    /// Create a new loader config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transmission timeout
    #[must_use]
    pub fn with_transmit_timeout(mut self, timeout: Duration) -> Self {
        self.transmit_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the progress step in percentage points
    #[must_use]
    pub fn with_progress_step(mut self, percent: f64) -> Self {
        self.progress_step_percent = percent;
        self
    }

    /// Set the progress row interval
    #[must_use]
    pub fn with_progress_row_interval(mut self, rows: usize) -> Self {
        self.progress_row_interval = rows;
        self
    }
}

/// How much of a chunk (or a whole dataset) reached the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmissionOutcome {
    /// Every row was stored
    FullySucceeded(usize),
    /// Some rows were stored
    PartiallySucceeded {
        /// Rows stored
        succeeded: usize,
        /// Rows attempted
        total: usize,
    },
    /// Nothing was stored
    Failed(String),
}

/// Result of uploading one dataset
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Provenance tag of the dataset
    pub source: String,
    /// Destination table
    pub table: String,
    /// Rows confirmed as stored
    pub rows_uploaded: usize,
    /// Rows in the dataset
    pub rows_total: usize,
    /// Rows per chunk (0 when nothing was planned)
    pub chunk_size: usize,
    /// Chunks planned
    pub chunks: usize,
    /// Wall time spent
    pub elapsed: Duration,
    /// Original indices of rows never confirmed as stored
    pub failed_rows: Vec<usize>,
    /// Recovery file written, if any
    pub recovery: Option<RecoveryArtifact>,
    /// Cause when the store became unreachable
    pub failure: Option<String>,
}

impl UploadReport {
    /// Report for a dataset with no rows
    pub fn empty(source: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            table: table.into(),
            rows_uploaded: 0,
            rows_total: 0,
            chunk_size: 0,
            chunks: 0,
            elapsed: Duration::ZERO,
            failed_rows: Vec::new(),
            recovery: None,
            failure: None,
        }
    }

    /// Every row was stored
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.rows_uploaded == self.rows_total
    }

    /// The store became unreachable during the upload
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Dataset-level outcome
    pub fn outcome(&self) -> TransmissionOutcome {
        if let Some(cause) = &self.failure {
            return TransmissionOutcome::Failed(cause.clone());
        }
        match self.rows_uploaded {
            n if n == self.rows_total => TransmissionOutcome::FullySucceeded(n),
            0 => TransmissionOutcome::Failed(format!(
                "none of {} rows were stored",
                self.rows_total
            )),
            n => TransmissionOutcome::PartiallySucceeded {
                succeeded: n,
                total: self.rows_total,
            },
        }
    }
}
