//! Named segmentation parameters
//!
//! [`SegmentationParams`] is the option set a configuration layer hands to
//! [`segment`](crate::segment). Every field has a default, so a JSON
//! document only needs the fields it changes:
//!
//! ```
//! use cellseg::{SegmentationMethod, SegmentationParams};
//!
//! let params = SegmentationParams::from_json(r#"{ "method": "watershed", "min_size": 10 }"#).unwrap();
//! assert_eq!(params.method, SegmentationMethod::Watershed);
//! assert_eq!(params.max_size, 1000);
//! ```

use crate::segment_error::{SegmentError, SegmentResult};
use cellseg_filter::{RecursiveThresholdOptions, ThresholdOptions};
use cellseg_region::WatershedOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which segmentation strategy [`segment`](crate::segment) runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMethod {
    /// Global maximum-separability threshold, then labeling
    #[default]
    Threshold,
    /// Local-maximum separability threshold, then labeling
    LocalMaxThreshold,
    /// Global threshold refined per oversized region
    RecursiveThreshold,
    /// Global threshold, then unseeded watershed of the foreground
    Watershed,
    /// Global threshold, then watershed grown from caller-supplied seeds
    SeededWatershed,
}

impl SegmentationMethod {
    /// True if the method needs a seed label map
    pub fn needs_seeds(self) -> bool {
        self == SegmentationMethod::SeededWatershed
    }
}

/// Segmentation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentationParams {
    pub method: SegmentationMethod,
    /// Smallest region kept
    pub min_size: usize,
    /// Largest region kept (re-thresholded instead for the recursive method)
    pub max_size: usize,
    pub adaptive_increment: bool,
    pub threshold_increment: u32,
    /// Median background radius; 0 disables background subtraction
    pub box_radius: usize,
    pub max_recursions: usize,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            method: SegmentationMethod::default(),
            min_size: 25,
            max_size: 1000,
            adaptive_increment: false,
            threshold_increment: 1,
            box_radius: 0,
            max_recursions: 3,
        }
    }
}

impl SegmentationParams {
    /// Create new parameters with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method
    pub fn with_method(mut self, method: SegmentationMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the region size bounds
    pub fn with_size_range(mut self, min_size: usize, max_size: usize) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Set the background subtraction radius
    pub fn with_box_radius(mut self, box_radius: usize) -> Self {
        self.box_radius = box_radius;
        self
    }

    /// Set the recursion budget
    pub fn with_max_recursions(mut self, max_recursions: usize) -> Self {
        self.max_recursions = max_recursions;
        self
    }

    /// Set threshold candidate spacing
    pub fn with_increment(mut self, adaptive: bool, threshold_increment: u32) -> Self {
        self.adaptive_increment = adaptive;
        self.threshold_increment = threshold_increment;
        self
    }

    /// Parse and validate parameters from JSON
    ///
    /// # Errors
    ///
    /// Returns `SegmentError::Json` for malformed JSON or unknown fields and
    /// `SegmentError::Params` if validation fails.
    pub fn from_json(json: &str) -> SegmentResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Read parameters from a JSON file
    pub fn from_path(path: &Path) -> SegmentResult<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Check the parameters
    ///
    /// # Errors
    ///
    /// Returns `SegmentError::Params` if `min_size > max_size` or the
    /// fixed threshold increment is 0.
    pub fn validate(&self) -> SegmentResult<()> {
        if self.min_size > self.max_size {
            return Err(SegmentError::Params(format!(
                "min_size {} exceeds max_size {}",
                self.min_size, self.max_size
            )));
        }
        if !self.adaptive_increment && self.threshold_increment == 0 {
            return Err(SegmentError::Params(
                "threshold_increment must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn threshold_options(&self) -> ThresholdOptions {
        ThresholdOptions::new()
            .with_adaptive_increment(self.adaptive_increment)
            .with_threshold_increment(self.threshold_increment)
    }

    pub fn recursive_options(&self) -> RecursiveThresholdOptions {
        RecursiveThresholdOptions::new()
            .with_area_min(self.min_size)
            .with_area_max(self.max_size)
            .with_max_recursions(self.max_recursions)
            .with_threshold(self.threshold_options())
    }

    pub fn watershed_options(&self) -> WatershedOptions {
        WatershedOptions::default()
    }
}
