//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur during regression testing
#[derive(Debug, Error)]
pub enum TestError {
    /// Value comparison failed
    #[error(
        "value comparison failed at index {index}: expected {expected}, got {actual}, delta {delta}"
    )]
    ValueMismatch {
        index: usize,
        expected: f64,
        actual: f64,
        delta: f64,
    },

    /// Grid comparison failed
    #[error("grid comparison failed at index {index}: {reason}")]
    GridMismatch { index: usize, reason: String },

    /// Synthetic image could not be built
    #[error("synthetic image: {0}")]
    Synth(#[from] cellseg_core::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
