//! Error types for the segmentation pipeline

use crate::params::SegmentationMethod;
use thiserror::Error;

/// Errors that abort a segmentation step
#[derive(Debug, Error)]
pub enum SegmentError {
    /// The method needs an input grid that was not supplied
    #[error("{method:?} requires a {what}, but none was supplied")]
    MissingReference {
        /// Description of the missing grid
        what: &'static str,
        /// Method that needed it
        method: SegmentationMethod,
    },

    /// Parameters failed validation
    #[error("invalid parameters: {0}")]
    Params(String),

    /// Parameters could not be parsed
    #[error("failed to parse parameters: {0}")]
    Json(#[from] serde_json::Error),

    /// Parameter file could not be read
    #[error("failed to read parameters: {0}")]
    Io(#[from] std::io::Error),

    /// Filter error
    #[error("filter error: {0}")]
    Filter(#[from] cellseg_filter::FilterError),

    /// Region error
    #[error("region error: {0}")]
    Region(#[from] cellseg_region::RegionError),

    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] cellseg_core::Error),
}

/// Result type for segmentation
pub type SegmentResult<T> = Result<T, SegmentError>;
