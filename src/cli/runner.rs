//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_config, LoadConfig};
use crate::error::{Error, Result};
use crate::orchestrator::Orchestrator;
use crate::sink::{DuckDbSink, MemorySink, Sink};
use crate::source::discover_sources;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Load {
                input,
                database,
                table,
                create_table,
                recovery_dir,
                dry_run,
            } => {
                self.load(
                    input,
                    database.as_deref(),
                    table,
                    *create_table,
                    recovery_dir.as_deref(),
                    *dry_run,
                )
                .await
            }
            Commands::Plan { rows } => self.plan(*rows),
            Commands::Check { database } => self.check(database).await,
        }
    }

    /// Load the run configuration (defaults when no file was given)
    fn load_config(&self) -> Result<LoadConfig> {
        match &self.cli.config {
            Some(path) => load_config(path),
            None => Ok(LoadConfig::default()),
        }
    }

    /// Load command
    async fn load(
        &self,
        input: &Path,
        database: Option<&Path>,
        table: &str,
        create_table: bool,
        recovery_dir: Option<&Path>,
        dry_run: bool,
    ) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(dir) = recovery_dir {
            config.recovery.dir = dir.to_path_buf();
        }

        let sources = resolve_sources(input, &config)?;
        if sources.is_empty() {
            warn!("No source files found in {}", input.display());
        }

        let mut sink: Box<dyn Sink> = if dry_run {
            info!("Dry run: rows are loaded into memory only");
            Box::new(MemorySink::new())
        } else {
            let path = database
                .ok_or_else(|| Error::config("--database is required unless --dry-run is set"))?;
            Box::new(DuckDbSink::open(path)?.with_max_parameters(config.sink.max_parameters))
        };

        info!("Testing connection...");
        sink.check_connection().await?;
        info!("Connection successful!");

        let orchestrator = Orchestrator::new(&config, table)
            .with_create_table(create_table)
            .with_progress_bar(matches!(self.cli.format, OutputFormat::Pretty));
        let summary = orchestrator.run(&sources, sink.as_mut()).await;

        self.output_message(&serde_json::to_value(&summary)?);

        if summary.files_failed > 0 {
            return Err(Error::Other(format!(
                "{} of {} files could not be loaded",
                summary.files_failed, summary.files_found
            )));
        }
        Ok(())
    }

    /// Plan command
    fn plan(&self, rows: usize) -> Result<()> {
        let config = self.load_config()?;
        let plan = config.chunking.plan_chunks(rows);

        self.output_message(&json!({
            "rows": rows,
            "chunk_size": plan.chunk_size,
            "chunk_count": plan.chunk_count
        }));
        Ok(())
    }

    /// Check command
    async fn check(&self, database: &Path) -> Result<()> {
        let mut sink = DuckDbSink::open(database)?;

        match sink.check_connection().await {
            Ok(()) => {
                self.output_message(&json!({
                    "status": "SUCCEEDED",
                    "database": sink.location()
                }));
                Ok(())
            }
            Err(e) => {
                self.output_message(&json!({
                    "status": "FAILED",
                    "database": sink.location(),
                    "message": e.to_string()
                }));
                Err(e.into())
            }
        }
    }

    /// Output a JSON message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Files to load: the input file itself, or the matching files in a directory
fn resolve_sources(input: &Path, config: &LoadConfig) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        discover_sources(input, &config.source.extensions)
    } else if input.is_file() {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(Error::FileNotFound {
            path: input.display().to_string(),
        })
    }
}
