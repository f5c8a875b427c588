//! Run summary types

use crate::loader::UploadReport;
use crate::recovery::RecoveryArtifact;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// What happened to one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Every row was stored
    Uploaded,
    /// Some rows were stored, the rest went to a recovery file
    Partial,
    /// No row was stored
    Failed,
    /// The file held no data rows
    Skipped,
}

/// Outcome for one source file
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    /// File that was loaded
    pub path: PathBuf,
    /// Provenance tag (file name)
    pub source: String,
    /// Outcome
    pub status: FileStatus,
    /// Data rows read from the file
    pub rows_read: usize,
    /// Rows confirmed as stored
    pub rows_uploaded: usize,
    /// Recovery file written, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoveryArtifact>,
    /// Read, preparation or transmission error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time for this file in milliseconds
    pub elapsed_ms: u64,
}

impl FileSummary {
    /// Summary for a file that could not be read or prepared
    pub fn failed(path: PathBuf, source: String, error: String, elapsed: Duration) -> Self {
        Self {
            path,
            source,
            status: FileStatus::Failed,
            rows_read: 0,
            rows_uploaded: 0,
            recovery: None,
            error: Some(error),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Summary for a file without data rows
    pub fn skipped(path: PathBuf, source: String, elapsed: Duration) -> Self {
        Self {
            path,
            source,
            status: FileStatus::Skipped,
            rows_read: 0,
            rows_uploaded: 0,
            recovery: None,
            error: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Summary built from an upload report
    pub fn from_report(path: PathBuf, report: UploadReport, elapsed: Duration) -> Self {
        let status = if report.rows_uploaded == 0 {
            FileStatus::Failed
        } else if report.is_complete() {
            FileStatus::Uploaded
        } else {
            FileStatus::Partial
        };

        Self {
            path,
            source: report.source,
            status,
            rows_read: report.rows_total,
            rows_uploaded: report.rows_uploaded,
            recovery: report.recovery,
            error: report.failure,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Whether the file counts as processed: at least one row was stored
    pub fn is_processed(&self) -> bool {
        self.rows_uploaded > 0
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Source files found
    pub files_found: usize,
    /// Files with at least one stored row
    pub files_processed: usize,
    /// Files where nothing was stored
    pub files_failed: usize,
    /// Files without data rows
    pub files_skipped: usize,
    /// Rows stored across all files
    pub total_rows: usize,
    /// Per-file outcomes, in processing order
    pub files: Vec<FileSummary>,
    /// Wall time for the run in milliseconds
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Add one file's outcome to the totals
    pub fn record(&mut self, file: FileSummary) {
        match file.status {
            FileStatus::Skipped => self.files_skipped += 1,
            _ if file.is_processed() => self.files_processed += 1,
            _ => self.files_failed += 1,
        }
        self.total_rows += file.rows_uploaded;
        self.files.push(file);
    }

    /// Recovery files written during the run
    pub fn recovery_files(&self) -> impl Iterator<Item = &RecoveryArtifact> {
        self.files.iter().filter_map(|f| f.recovery.as_ref())
    }
}
