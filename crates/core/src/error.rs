//! Error types for the agentkit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all agentkit operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // --- History processing errors ---
    #[error("History processor error: {0}")]
    History(#[from] HistoryError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Failed to read config file at {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config source {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid override '{entry}': {reason}")]
    InvalidOverride { entry: String, reason: String },

    #[error("Config does not match schema: {0}")]
    Schema(String),

    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    #[error("Invalid parameter for {processor}: {reason}")]
    InvalidParameter { processor: String, reason: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unsafe processor ordering: {0}")]
    ReferentialHazard(String),
}

impl HistoryError {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid(processor: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            processor: processor.to_string(),
            reason: reason.into(),
        }
    }
}
