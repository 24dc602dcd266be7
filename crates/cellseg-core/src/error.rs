//! Error types for cellseg-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Each variant captures enough context for diagnostics without exposing
//! internal implementation details.

use thiserror::Error;

/// cellseg core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid grid dimensions
    #[error("invalid grid dimensions: {width}x{height}x{depth}")]
    InvalidDimension {
        width: usize,
        height: usize,
        depth: usize,
    },

    /// Grid shape mismatch between two grids that must agree
    #[error(
        "dimension mismatch: expected {}x{}x{}, got {}x{}x{}",
        .expected[0], .expected[1], .expected[2], .actual[0], .actual[1], .actual[2]
    )]
    DimensionMismatch {
        expected: [usize; 3],
        actual: [usize; 3],
    },

    /// Raw data does not match the requested shape
    #[error("data length {len} doesn't match {width}x{height}x{depth}")]
    DataLength {
        len: usize,
        width: usize,
        height: usize,
        depth: usize,
    },

    /// Coordinate outside the grid
    #[error("coordinate ({x}, {y}, {z}) out of bounds")]
    OutOfBounds { x: usize, y: usize, z: usize },

    /// Bounding box not fully inside the grid
    #[error("bounding box {0} exceeds grid bounds")]
    BoxOutOfBounds(String),

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for cellseg core operations
pub type Result<T> = std::result::Result<T, Error>;
