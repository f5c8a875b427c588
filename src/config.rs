//! Run configuration
//!
//! One YAML file configures a whole run. Every section and field has a
//! default, so an empty file (or no file at all) is valid:
//!
//! ```yaml
//! chunking:
//!   default_size: 10000
//!   tiers:
//!     - { above: 10000, chunk_size: 5000 }
//!     - { above: 100000, chunk_size: 3000 }
//! loader:
//!   transmit_timeout_ms: 60000
//!   progress_step_percent: 2.0
//!   progress_row_interval: 10000
//! recovery:
//!   dir: ./recovery
//!   failed_upload_scope: unconfirmed
//! source:
//!   extensions: [csv]
//! prepare:
//!   numeric_columns: [STT, Số tiền trước km]
//!   timestamp_columns: [Thời gian thanh toán]
//! sink:
//!   max_parameters: 2100
//! ```

use crate::error::{Error, Result};
use crate::loader::LoaderConfig;
use crate::planner::ChunkPolicy;
use crate::prepare::PrepareConfig;
use crate::recovery::RecoveryConfig;
use crate::source::SourceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Chunk size policy
    #[serde(default)]
    pub chunking: ChunkPolicy,

    /// Bulk loader settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Recovery file settings
    #[serde(default)]
    pub recovery: RecoveryConfig,

    /// Source file settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Preparation rules
    #[serde(default)]
    pub prepare: PrepareConfig,

    /// Destination settings
    #[serde(default)]
    pub sink: SinkConfig,
}

// ============================================================================
// Sink Config
// ============================================================================

/// Destination settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Ceiling on bound parameters per bulk statement
    #[serde(default)]
    pub max_parameters: Option<usize>,
}

// ============================================================================
// Loading
// ============================================================================

/// Load a run configuration from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> Result<LoadConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_config_from_str(&content)
}

/// Load a run configuration from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<LoadConfig> {
    let config: LoadConfig = if yaml.trim().is_empty() {
        LoadConfig::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    config.validate()?;
    Ok(config)
}

impl LoadConfig {
    /// Reject values the loader cannot work with
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        let step = self.loader.progress_step_percent;
        if !step.is_finite() || step <= 0.0 {
            return Err(Error::invalid_value(
                "loader.progress_step_percent",
                format!("must be a positive number, got {step}"),
            ));
        }

        if !self.recovery.delimiter.is_ascii() {
            return Err(Error::invalid_value(
                "recovery.delimiter",
                "delimiter must be a single ASCII character",
            ));
        }
        self.source.delimiter_byte()?;

        if let Some(column) = self
            .prepare
            .numeric_columns
            .iter()
            .find(|c| self.prepare.timestamp_columns.contains(c))
        {
            return Err(Error::invalid_value(
                "prepare",
                format!("column '{column}' is both numeric and timestamp"),
            ));
        }

        if self.sink.max_parameters == Some(0) {
            return Err(Error::invalid_value(
                "sink.max_parameters",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::FailedUploadScope;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, LoadConfig::default());
        assert_eq!(config.chunking.plan(150_000), 3_000);
        assert_eq!(config.loader.transmit_timeout_ms, 60_000);
        assert_eq!(config.prepare.source_column.as_deref(), Some("SourceFile"));
        assert_eq!(config.sink.max_parameters, None);
    }

    #[test]
    fn test_full_config() {
        let yaml = r"
chunking:
  default_size: 50
  tiers:
    - above: 100
      chunk_size: 30
loader:
  transmit_timeout_ms: 5000
  progress_row_interval: 0
recovery:
  dir: /var/lib/txload/recovery
  failed_upload_scope: full
source:
  delimiter: ';'
  extensions: [csv, txt]
prepare:
  numeric_columns: [STT, Tỷ giá]
  timestamp_columns: [Thời gian thanh toán]
  source_column: null
sink:
  max_parameters: 2100
";
        let config = load_config_from_str(yaml).unwrap();

        assert_eq!(config.chunking.plan(101), 30);
        assert_eq!(config.chunking.plan(100), 50);
        assert_eq!(config.loader.transmit_timeout_ms, 5_000);
        assert!((config.loader.progress_step_percent - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.loader.progress_row_interval, 0);
        assert_eq!(
            config.recovery.dir,
            PathBuf::from("/var/lib/txload/recovery")
        );
        assert_eq!(config.recovery.failed_upload_scope, FailedUploadScope::Full);
        assert_eq!(config.source.delimiter, ';');
        assert_eq!(config.prepare.numeric_columns, vec!["STT", "Tỷ giá"]);
        assert_eq!(config.prepare.source_column, None);
        assert_eq!(config.sink.max_parameters, Some(2_100));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = load_config_from_str("chunking:\n  default_size: 0").unwrap_err();
        assert!(err.to_string().contains("chunking.default_size"));
    }

    #[test]
    fn test_non_positive_progress_step_rejected() {
        let err = load_config_from_str("loader:\n  progress_step_percent: 0").unwrap_err();
        assert!(err.to_string().contains("progress_step_percent"));
    }

    #[test]
    fn test_conflicting_column_kinds_rejected() {
        let yaml = "prepare:\n  numeric_columns: [a]\n  timestamp_columns: [a]";
        let err = load_config_from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("both numeric and timestamp"));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = load_config_from_str("chunking: [").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/txload.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txload.yaml");
        fs::write(&path, "sink:\n  max_parameters: 999\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.sink.max_parameters, Some(999));
    }
}
