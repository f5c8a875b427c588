//! CLI module
//!
//! Command-line interface for loading source files.
//!
//! # Commands
//!
//! - `load` - Read, prepare and upload source files into a table
//! - `plan` - Show the chunk plan for a row count
//! - `check` - Test the connection to a database

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
