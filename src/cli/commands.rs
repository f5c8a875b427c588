//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chunked bulk loader for delimited transaction exports
#[derive(Parser, Debug)]
#[command(name = "txload")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load source files into a table
    Load {
        /// Source file, or directory scanned for source files
        #[arg(short, long)]
        input: PathBuf,

        /// DuckDB database file (not needed with --dry-run)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Destination table, optionally schema-qualified (e.g. vnpay.transactions)
        #[arg(short, long)]
        table: String,

        /// Create the table from the first file's columns if it does not exist
        #[arg(long)]
        create_table: bool,

        /// Directory for recovery files (overrides the config file)
        #[arg(long)]
        recovery_dir: Option<PathBuf>,

        /// Load into an in-memory sink instead of a database
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the chunk size and chunk count for a row count
    Plan {
        /// Number of rows in the dataset
        #[arg(long)]
        rows: usize,
    },

    /// Test the connection to a database
    Check {
        /// DuckDB database file
        #[arg(short, long)]
        database: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
