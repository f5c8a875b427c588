//! Delimited file reader

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source reader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// File extensions picked up when scanning a directory (case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            extensions: default_extensions(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_extensions() -> Vec<String> {
    vec!["csv".to_string()]
}

impl SourceConfig {
    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Field delimiter as a single byte
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                Error::invalid_value(
                    "source.delimiter",
                    format!("'{}' is not a single-byte character", self.delimiter),
                )
            })
    }
}

/// Untyped table as read from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Provenance tag (file name)
    pub source: String,
    /// Header cells
    pub headers: Vec<String>,
    /// Data rows, one string per cell
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a delimited file with a header row
///
/// Rows with a different number of cells than the header are kept as-is;
/// preparation rejects them with the offending row number.
pub fn read_table(path: impl AsRef<Path>, config: &SourceConfig) -> Result<RawTable> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }

    info!("  Loading file: {}", path.display());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter_byte()?)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(String::from).collect());
    }

    let table = RawTable {
        source: source_name(path),
        headers,
        rows,
    };
    info!(
        "  File loaded: {} rows, {} columns",
        table.len(),
        table.headers.len()
    );
    Ok(table)
}

/// List files in `dir` whose extension is one of `extensions`, sorted by path
///
/// Not recursive.
pub fn discover_sources(dir: impl AsRef<Path>, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::FileNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            found.push(path);
        }
    }
    found.sort();

    debug!("Found {} source files in {}", found.len(), dir.display());
    Ok(found)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Provenance tag for a path: its file name
pub fn source_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
