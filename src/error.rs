//! Error types for txload
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Sink failures have their own type because the loader inspects them to
//! decide between row-level fallback and abandoning a dataset.

use thiserror::Error;

/// The main error type for txload
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    // ============================================================================
    // Source / Preparation Errors
    // ============================================================================
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to prepare '{source_name}': {message}")]
    Preparation {
        source_name: String,
        message: String,
    },

    // ============================================================================
    // Sink Errors
    // ============================================================================
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    // ============================================================================
    // Recovery Errors
    // ============================================================================
    #[error("Failed to write recovery file '{path}': {message}")]
    Recovery { path: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a preparation error for a named source
    pub fn preparation(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Preparation {
            source_name: source.into(),
            message: message.into(),
        }
    }

    /// Create a recovery error
    pub fn recovery(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Recovery {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failure reported by a [`Sink`](crate::sink::Sink) for one transmission call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The statement was rejected; the connection is still usable
    #[error("statement failed: {0}")]
    Statement(String),

    /// The connection to the store is gone; nothing further can be sent
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The call did not complete within the transmission timeout
    #[error("transmission timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl SinkError {
    /// Create a statement error
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement(message.into())
    }

    /// Create a connection lost error
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost(message.into())
    }

    /// Whether this failure means no further transmission can succeed
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}

/// Result type alias for txload
pub type Result<T> = std::result::Result<T, Error>;
