//! Recovery file writer

use crate::error::{Error, Result};
use crate::types::Dataset;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Which situation produced a recovery artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Rows rejected individually after their chunk failed
    Remaining,
    /// Rows left behind when the store became unreachable
    FailedUpload,
}

impl ArtifactKind {
    /// File name prefix
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Remaining => "remaining",
            Self::FailedUpload => "failed_upload",
        }
    }
}

/// Rows written to the failed-upload artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedUploadScope {
    /// Only rows not confirmed as stored
    #[default]
    Unconfirmed,
    /// The whole dataset, including rows already stored
    Full,
}

/// Recovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Directory recovery files are written to
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Rows included when the store becomes unreachable
    #[serde(default)]
    pub failed_upload_scope: FailedUploadScope,

    /// Prefix files with a UTF-8 byte order mark
    #[serde(default = "default_true")]
    pub write_bom: bool,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            failed_upload_scope: FailedUploadScope::default(),
            write_bom: default_true(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

impl RecoveryConfig {
    /// Set the output directory
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Set the failed-upload scope
    #[must_use]
    pub fn with_failed_upload_scope(mut self, scope: FailedUploadScope) -> Self {
        self.failed_upload_scope = scope;
        self
    }

    /// Enable or disable the byte order mark
    #[must_use]
    pub fn with_bom(mut self, enabled: bool) -> Self {
        self.write_bom = enabled;
        self
    }
}

/// A recovery file that was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryArtifact {
    /// Location of the file
    pub path: PathBuf,
    /// Why it was written
    pub kind: ArtifactKind,
    /// Number of data rows (header excluded)
    pub rows: usize,
}

/// Writes recovery files
#[derive(Debug, Clone, Default)]
pub struct RecoveryWriter {
    config: RecoveryConfig,
}

impl RecoveryWriter {
    /// Create a writer
    pub fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    /// Writer configuration
    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Path of the artifact for a source, e.g. `remaining_march.xlsx.csv`
    pub fn artifact_path(&self, kind: ArtifactKind, source: &str) -> PathBuf {
        let base = Path::new(source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "dataset".to_string());
        self.config
            .dir
            .join(format!("{}_{base}.csv", kind.prefix()))
    }

    /// Write the rows at `indices` (in the given order) of `dataset`
    pub fn write(
        &self,
        kind: ArtifactKind,
        dataset: &Dataset,
        indices: &[usize],
    ) -> Result<RecoveryArtifact> {
        let path = self.artifact_path(kind, dataset.source());
        let location = path.display().to_string();

        if !self.config.delimiter.is_ascii() {
            return Err(Error::invalid_value(
                "recovery.delimiter",
                "delimiter must be a single ASCII character",
            ));
        }

        fs::create_dir_all(&self.config.dir)
            .map_err(|e| Error::recovery(&location, format!("Failed to create directory: {e}")))?;

        let file = File::create(&path)
            .map_err(|e| Error::recovery(&location, format!("Failed to create file: {e}")))?;
        let mut out = BufWriter::new(file);
        if self.config.write_bom {
            out.write_all(UTF8_BOM)
                .map_err(|e| Error::recovery(&location, e.to_string()))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.config.delimiter as u8)
            .from_writer(out);

        writer
            .write_record(dataset.columns())
            .map_err(|e| Error::recovery(&location, e.to_string()))?;

        let rows = dataset.rows();
        let mut written = 0;
        for &index in indices {
            let Some(row) = rows.get(index) else {
                return Err(Error::recovery(
                    &location,
                    format!("row index {index} is out of range"),
                ));
            };
            writer
                .write_record(row.iter().map(|v| v.to_text().unwrap_or_default()))
                .map_err(|e| Error::recovery(&location, e.to_string()))?;
            written += 1;
        }

        writer
            .flush()
            .map_err(|e| Error::recovery(&location, e.to_string()))?;

        tracing::info!("Saved {} rows to {}", written, location);

        Ok(RecoveryArtifact {
            path,
            kind,
            rows: written,
        })
    }
}
