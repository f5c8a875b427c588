// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::fn_params_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # txload
//!
//! Chunked bulk loading of delimited transaction exports into a relational
//! store, with row-level fallback and local recovery files.
//!
//! ## Features
//!
//! - **Chunk planning**: batch size follows the dataset's row count so bulk
//!   statements stay under the store's parameter ceiling
//! - **Row-level fallback**: a rejected chunk is retried row by row, so one
//!   bad row does not cost the whole batch
//! - **Progress and ETA**: periodic throughput and time-remaining reports
//! - **Recovery files**: rows never confirmed as stored are written to
//!   `remaining_*.csv` / `failed_upload_*.csv` for later re-ingestion
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use txload::loader::BulkLoader;
//! use txload::sink::DuckDbSink;
//! use txload::{prepare, read_table, PrepareConfig, SourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> txload::Result<()> {
//!     let table = read_table("exports/march.csv", &SourceConfig::default())?;
//!     let dataset = prepare(table, &PrepareConfig::default())?;
//!
//!     let mut sink = DuckDbSink::open("transactions.duckdb")?;
//!     sink.ensure_table("transactions", &dataset)?;
//!
//!     let report = BulkLoader::default()
//!         .upload(&dataset, &mut sink, "transactions")
//!         .await?;
//!     println!("{} of {} rows stored", report.rows_uploaded, report.rows_total);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  CLI ──▶ Orchestrator ──▶ Source ──▶ Prepare ──▶ Bulk Loader ──▶ Sink
//!                                                     │   ▲
//!                                     Chunk Planner ──┘   │
//!                                                         ▼
//!                                                  Recovery Writer
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Values, rows and datasets
pub mod types;

/// Delimited source files
pub mod source;

/// Raw table to typed dataset conversion
pub mod prepare;

/// Destination stores
pub mod sink;

/// Chunk size policy
pub mod planner;

/// Chunked bulk loader
pub mod loader;

/// Recovery files
pub mod recovery;

/// Multi-file runs
pub mod orchestrator;

/// Run configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, SinkError};
pub use types::*;

// Re-export commonly used types
pub use config::{load_config, load_config_from_str, LoadConfig};
pub use loader::{BulkLoader, UploadReport};
pub use orchestrator::{Orchestrator, RunSummary};
pub use prepare::{prepare, PrepareConfig};
pub use source::{read_table, RawTable, SourceConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
