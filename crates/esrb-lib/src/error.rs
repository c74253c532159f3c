//! Error types for the predictor library

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by data loading, training, persistence and prediction
#[derive(Debug, Error)]
pub enum PredictorError {
    /// No model has been trained or loaded yet
    #[error("You must train or load a model before {operation}")]
    ModelNotReady { operation: &'static str },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {}: {message}", path.display())]
    Csv { path: PathBuf, message: String },

    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("Invalid label '{label}' on line {line}")]
    InvalidLabel { label: String, line: u64 },

    #[error("Invalid model artifact: {0}")]
    Artifact(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Test fraction must be strictly between 0 and 1, got {0}")]
    InvalidTestFraction(f64),
}

impl PredictorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PredictorError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for the "operation invalid in current state" condition
    pub fn is_not_ready(&self) -> bool {
        matches!(self, PredictorError::ModelNotReady { .. })
    }

    /// Returns true for file access failures
    pub fn is_io(&self) -> bool {
        matches!(self, PredictorError::Io { .. })
    }
}

pub type Result<T, E = PredictorError> = std::result::Result<T, E>;
