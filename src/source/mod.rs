//! Tabular source module
//!
//! Reads delimited files into untyped [`RawTable`]s and discovers the files
//! to load in an input directory. Typing happens later in
//! [`prepare`](crate::prepare).

mod reader;

pub use reader::{discover_sources, read_table, source_name, RawTable, SourceConfig};

#[cfg(test)]
mod tests;
