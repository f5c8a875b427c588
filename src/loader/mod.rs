//! Bulk loader module
//!
//! Persists a [`Dataset`] to a [`Sink`] chunk by chunk.
//!
//! # Overview
//!
//! - Each chunk is sent as one all-or-nothing bulk append.
//! - A rejected chunk is retried row by row; rejected rows are logged with
//!   their original index and skipped.
//! - Progress is reported every few percent (or every N rows) with
//!   throughput and an estimate of the time remaining.
//! - Rows never confirmed are written to a `remaining_*` recovery file.
//! - If the store becomes unreachable, the upload stops and the rows left
//!   behind go to a `failed_upload_*` recovery file.
//!
//! Transmission faults never escape as errors: they are folded into the
//! [`UploadReport`]. `upload` only returns `Err` when the recovery file
//! itself cannot be written.

mod progress;
mod types;

pub use progress::{
    format_duration, group_thousands, BarObserver, LogObserver, ProgressObserver, ProgressUpdate,
};
pub use types::{LoaderConfig, TransmissionOutcome, UploadReport};

use crate::error::{Result, SinkError};
use crate::planner::{ChunkPlan, ChunkPolicy};
use crate::recovery::{ArtifactKind, FailedUploadScope, RecoveryWriter};
use crate::sink::{Sink, SinkResult};
use crate::types::{Chunk, Dataset};
use progress::ProgressState;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Chunked bulk loader
#[derive(Debug, Clone, Default)]
pub struct BulkLoader {
    /// Chunk size policy
    policy: ChunkPolicy,
    /// Loader configuration
    config: LoaderConfig,
    /// Recovery file writer
    recovery: RecoveryWriter,
}

/// Per-upload bookkeeping: which original rows were confirmed, and progress
struct UploadState {
    confirmed: Vec<bool>,
    progress: ProgressState,
}

impl UploadState {
    fn unconfirmed(&self) -> Vec<usize> {
        self.confirmed
            .iter()
            .enumerate()
            .filter(|(_, ok)| !**ok)
            .map(|(i, _)| i)
            .collect()
    }
}

impl BulkLoader {
    /// Create a loader
    pub fn new(policy: ChunkPolicy, config: LoaderConfig, recovery: RecoveryWriter) -> Self {
        Self {
            policy,
            config,
            recovery,
        }
    }

    /// Chunk size policy
    pub fn policy(&self) -> &ChunkPolicy {
        &self.policy
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Upload `dataset` to `table`, logging progress
    pub async fn upload(
        &self,
        dataset: &Dataset,
        sink: &mut dyn Sink,
        table: &str,
    ) -> Result<UploadReport> {
        self.upload_with_observer(dataset, sink, table, &mut LogObserver)
            .await
    }

    /// Upload `dataset` to `table`, sending progress to `observer`
    pub async fn upload_with_observer(
        &self,
        dataset: &Dataset,
        sink: &mut dyn Sink,
        table: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<UploadReport> {
        let total = dataset.len();
        if total == 0 {
            info!("  {} has no rows, nothing to upload", dataset.source());
            return Ok(UploadReport::empty(dataset.source(), table));
        }

        let plan = self.policy.plan_chunks(total);
        info!(
            "  Uploading {} rows to {} on {} in {} chunks of {}",
            group_thousands(total),
            table,
            sink.name(),
            plan.chunk_count,
            group_thousands(plan.chunk_size)
        );

        let mut state = UploadState {
            confirmed: vec![false; total],
            progress: ProgressState::new(total, &self.config),
        };

        if let Err(cause) = sink.check_connection().await {
            return self.abandon(dataset, table, plan, &state, &cause);
        }

        for chunk in dataset.chunks(plan.chunk_size) {
            match self
                .transmit_chunk(sink, table, dataset, chunk, &mut state, observer)
                .await
            {
                Ok(outcome) => debug!(
                    "  Chunk at position {}: {:?}",
                    chunk.offset, outcome
                ),
                Err(cause) => return self.abandon(dataset, table, plan, &state, &cause),
            }
        }

        self.finish(dataset, table, plan, &state)
    }

    /// Send one chunk, falling back to single rows when the bulk call fails
    ///
    /// Returns `Err` only when the connection is lost.
    async fn transmit_chunk(
        &self,
        sink: &mut dyn Sink,
        table: &str,
        dataset: &Dataset,
        chunk: Chunk<'_>,
        state: &mut UploadState,
        observer: &mut dyn ProgressObserver,
    ) -> std::result::Result<TransmissionOutcome, SinkError> {
        let columns = dataset.columns();

        match self
            .timed(sink.bulk_append(table, columns, chunk.rows))
            .await
        {
            Ok(()) => {
                for (index, _) in chunk.indexed_rows() {
                    state.confirmed[index] = true;
                }
                if let Some(update) = state.progress.record(chunk.len(), chunk.len()) {
                    observer.observe(&update);
                }
                return Ok(TransmissionOutcome::FullySucceeded(chunk.len()));
            }
            Err(e) if e.is_connection_lost() => return Err(e),
            Err(e) => {
                warn!("  Error uploading chunk at position {}: {}", chunk.offset, e);
                warn!("  Trying with individual row inserts...");
            }
        }

        let mut succeeded = 0;
        let mut last_error = None;
        for (index, row) in chunk.indexed_rows() {
            let stored = match self.timed(sink.append_row(table, columns, row)).await {
                Ok(()) => {
                    state.confirmed[index] = true;
                    succeeded += 1;
                    1
                }
                Err(e) if e.is_connection_lost() => return Err(e),
                Err(e) => {
                    warn!("  Failed to insert row {}: {}", index, e);
                    last_error = Some(e);
                    0
                }
            };
            if let Some(update) = state.progress.record(1, stored) {
                observer.observe(&update);
            }
        }

        Ok(match last_error {
            None => TransmissionOutcome::FullySucceeded(succeeded),
            Some(e) if succeeded == 0 => TransmissionOutcome::Failed(e.to_string()),
            Some(_) => TransmissionOutcome::PartiallySucceeded {
                succeeded,
                total: chunk.len(),
            },
        })
    }

    /// Bound one sink call by the transmission timeout
    async fn timed<F>(&self, call: F) -> SinkResult<()>
    where
        F: Future<Output = SinkResult<()>>,
    {
        let timeout_ms = self.config.transmit_timeout_ms;
        if timeout_ms == 0 {
            return call.await;
        }
        tokio::time::timeout(Duration::from_millis(timeout_ms), call)
            .await
            .unwrap_or(Err(SinkError::Timeout { timeout_ms }))
    }

    /// Wrap up after every chunk was attempted
    fn finish(
        &self,
        dataset: &Dataset,
        table: &str,
        plan: ChunkPlan,
        state: &UploadState,
    ) -> Result<UploadReport> {
        let total = dataset.len();
        let uploaded = state.progress.succeeded();
        let elapsed = state.progress.elapsed();
        let failed_rows = state.unconfirmed();

        let recovery = if failed_rows.is_empty() {
            info!(
                "  Upload completed: {} rows in {}",
                group_thousands(uploaded),
                format_duration(elapsed)
            );
            None
        } else {
            warn!(
                "  Partial upload: {} of {} rows in {}",
                group_thousands(uploaded),
                group_thousands(total),
                format_duration(elapsed)
            );
            let artifact = self
                .recovery
                .write(ArtifactKind::Remaining, dataset, &failed_rows)?;
            warn!(
                "  Remaining {} rows saved to {}",
                group_thousands(artifact.rows),
                artifact.path.display()
            );
            Some(artifact)
        };

        Ok(UploadReport {
            source: dataset.source().to_string(),
            table: table.to_string(),
            rows_uploaded: uploaded,
            rows_total: total,
            chunk_size: plan.chunk_size,
            chunks: plan.chunk_count,
            elapsed,
            failed_rows,
            recovery,
            failure: None,
        })
    }

    /// Stop after the store became unreachable and divert the rows left behind
    fn abandon(
        &self,
        dataset: &Dataset,
        table: &str,
        plan: ChunkPlan,
        state: &UploadState,
        cause: &SinkError,
    ) -> Result<UploadReport> {
        error!("  Error during upload of {}: {}", dataset.source(), cause);

        let failed_rows = state.unconfirmed();
        let diverted: Vec<usize> = match self.recovery.config().failed_upload_scope {
            FailedUploadScope::Unconfirmed => failed_rows.clone(),
            FailedUploadScope::Full => (0..dataset.len()).collect(),
        };
        let artifact = self
            .recovery
            .write(ArtifactKind::FailedUpload, dataset, &diverted)?;
        error!(
            "  Data saved to {} ({} rows)",
            artifact.path.display(),
            group_thousands(artifact.rows)
        );

        Ok(UploadReport {
            source: dataset.source().to_string(),
            table: table.to_string(),
            rows_uploaded: state.progress.succeeded(),
            rows_total: dataset.len(),
            chunk_size: plan.chunk_size,
            chunks: plan.chunk_count,
            elapsed: state.progress.elapsed(),
            failed_rows,
            recovery: Some(artifact),
            failure: Some(cause.to_string()),
        })
    }
}
