//! Error types for hanbench.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for hanbench.
#[derive(Debug, Error)]
pub enum HanbenchError {
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A dataset or results file contained a line that is not a valid record.
    #[error("Invalid record in {path} (line {line}): {source}")]
    DataFormat {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The model backend failed to produce a response.
    #[error("Backend '{model}' failed: {message}")]
    Backend { model: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Precondition violation in accuracy aggregation.
    #[error("Length mismatch: {predictions} predictions vs {answers} answers")]
    LengthMismatch { predictions: usize, answers: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HanbenchError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a backend error.
    pub fn backend(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            model: model.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for hanbench.
pub type Result<T> = std::result::Result<T, HanbenchError>;
