//! cellseg-filter - Thresholding and rank filtering
//!
//! This crate provides the intensity filters of the cellseg pipeline:
//!
//! - Maximum-separability thresholding (global, local-maximum, recursive)
//! - Nelder-Mead simplex minimization and a double-Gaussian curve fit
//! - Sliding-histogram rank filtering (median, min, max) and background
//!   subtraction

mod error;
pub mod rank;
pub mod simplex;
pub mod threshold;

pub use error::{FilterError, FilterResult};

// Re-export commonly used functions
pub use rank::{BoxCount, RankFilterOptions, median_filter, rank_filter, subtract_background};
pub use simplex::{DoubleGaussian, Minimum, SimplexOptions, minimize};
pub use threshold::{
    LocalMaxThreshold, RecursiveThresholdOptions, SeparabilityCurve, ThresholdOptions,
    Thresholded, apply_threshold, class_means, compute_local_max_threshold,
    compute_separability_threshold, separability_curve, threshold_local_max,
    threshold_recursive, threshold_separability,
};
