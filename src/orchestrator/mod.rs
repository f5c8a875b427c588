//! Run orchestrator module
//!
//! Drives a run over many source files, one after the other:
//!
//! ```text
//! for each file:  read -> prepare -> (create table) -> upload
//! ```
//!
//! A file that cannot be read or prepared is counted as failed and the run
//! moves on. Empty files are skipped. The loader validates the sink before
//! each upload, so a store that went away between files sends that file's
//! rows to a `failed_upload_*` recovery file.

mod types;

pub use types::{FileStatus, FileSummary, RunSummary};

use crate::config::LoadConfig;
use crate::error::Result;
use crate::loader::{format_duration, group_thousands, BarObserver, BulkLoader};
use crate::prepare::{prepare, PrepareConfig};
use crate::recovery::RecoveryWriter;
use crate::sink::Sink;
use crate::source::{read_table, source_name, SourceConfig};
use crate::types::Dataset;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Loads source files into one table
#[derive(Debug, Clone)]
pub struct Orchestrator {
    loader: BulkLoader,
    source: SourceConfig,
    prepare: PrepareConfig,
    table: String,
    create_table: bool,
    progress_bar: bool,
}

impl Orchestrator {
    /// Create an orchestrator loading into `table`
    pub fn new(config: &LoadConfig, table: impl Into<String>) -> Self {
        Self {
            loader: BulkLoader::new(
                config.chunking.clone(),
                config.loader.clone(),
                RecoveryWriter::new(config.recovery.clone()),
            ),
            source: config.source.clone(),
            prepare: config.prepare.clone(),
            table: table.into(),
            create_table: false,
            progress_bar: false,
        }
    }

    /// Create the destination table from the first dataset's shape
    #[must_use]
    pub fn with_create_table(mut self, enabled: bool) -> Self {
        self.create_table = enabled;
        self
    }

    /// Show a terminal progress bar per file instead of logging progress
    #[must_use]
    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    /// Destination table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Load every file in `sources`, in order
    pub async fn run(&self, sources: &[PathBuf], sink: &mut dyn Sink) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary {
            files_found: sources.len(),
            ..RunSummary::default()
        };

        info!("Found {} source files", sources.len());
        let mut table_ready = !self.create_table;

        for (n, path) in sources.iter().enumerate() {
            info!(
                "Processing file {}/{}: {}",
                n + 1,
                sources.len(),
                source_name(path)
            );
            let file = self.load_file(path, sink, &mut table_ready).await;
            summary.record(file);
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        log_summary(&summary, &self.table);
        summary
    }

    /// Load one file
    async fn load_file(
        &self,
        path: &Path,
        sink: &mut dyn Sink,
        table_ready: &mut bool,
    ) -> FileSummary {
        let started = Instant::now();
        let source = source_name(path);

        let dataset = match self.read_dataset(path) {
            Ok(dataset) => dataset,
            Err(e) => {
                error!("Error processing file {}: {}", source, e);
                return FileSummary::failed(
                    path.to_path_buf(),
                    source,
                    e.to_string(),
                    started.elapsed(),
                );
            }
        };

        if dataset.is_empty() {
            info!("  No valid data found in file, skipping");
            return FileSummary::skipped(path.to_path_buf(), source, started.elapsed());
        }

        if !*table_ready {
            match sink.create_table(&self.table, &dataset).await {
                Ok(()) => info!("  Table {} is ready", self.table),
                Err(e) => {
                    warn!("  Error creating table {}: {}", self.table, e);
                    warn!("  Continuing anyway, assuming the table exists");
                }
            }
            *table_ready = true;
        }

        let upload = if self.progress_bar {
            let mut bar = BarObserver::new(dataset.len(), &source);
            let result = self
                .loader
                .upload_with_observer(&dataset, sink, &self.table, &mut bar)
                .await;
            bar.finish();
            result
        } else {
            self.loader.upload(&dataset, sink, &self.table).await
        };

        match upload {
            Ok(report) => {
                let elapsed = started.elapsed();
                if report.rows_uploaded > 0 {
                    info!(
                        "  Processed {} rows in {}",
                        group_thousands(report.rows_uploaded),
                        format_duration(elapsed)
                    );
                }
                FileSummary::from_report(path.to_path_buf(), report, elapsed)
            }
            Err(e) => {
                error!("Error processing file {}: {}", source, e);
                FileSummary::failed(path.to_path_buf(), source, e.to_string(), started.elapsed())
            }
        }
    }

    /// Read and prepare one file
    pub fn read_dataset(&self, path: &Path) -> Result<Dataset> {
        let table = read_table(path, &self.source)?;
        prepare(table, &self.prepare)
    }
}

fn log_summary(summary: &RunSummary, table: &str) {
    info!("=== Summary ===");
    info!("Total files found: {}", summary.files_found);
    info!("Total files processed successfully: {}", summary.files_processed);
    if summary.files_failed > 0 {
        warn!("Total files failed: {}", summary.files_failed);
    }
    if summary.files_skipped > 0 {
        info!("Total files skipped: {}", summary.files_skipped);
    }
    info!("Total rows uploaded: {}", group_thousands(summary.total_rows));
    info!(
        "Elapsed: {}",
        format_duration(Duration::from_millis(summary.elapsed_ms))
    );

    for artifact in summary.recovery_files() {
        warn!(
            "Recovery file: {} ({} rows)",
            artifact.path.display(),
            group_thousands(artifact.rows)
        );
    }

    if summary.files_processed > 0 {
        info!("Data has been loaded into {}", table);
    } else {
        warn!("No files were successfully processed");
    }
}
