//! cellseg - Segmentation of cell images
//!
//! Turns intensity grids (2D images or 3D stacks) into labeled regions.
//!
//! # Overview
//!
//! - Thresholding by maximum separability (global, local-maximum, recursive)
//! - Connected component labeling with union-find
//! - Seeded and unseeded watershed segmentation
//! - Sliding-histogram rank filtering and background subtraction
//!
//! # Example
//!
//! ```
//! use cellseg::{FloatGrid, SegmentationParams, segment};
//!
//! let mut image = FloatGrid::new_2d(20, 20).unwrap();
//! for c in image.coords() {
//!     if (4..10).contains(&c.x) && (4..10).contains(&c.y) {
//!         image.set(c, 200.0);
//!     }
//! }
//! let result = segment(&image, None, &SegmentationParams::default()).unwrap();
//! assert_eq!(result.region_count, 1);
//! ```

mod segment_error;
mod params;
mod pipeline;

// Re-export core types (primary data structures used everywhere)
pub use cellseg_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use cellseg_filter as filter;
pub use cellseg_region as region;

pub use segment_error::{SegmentError, SegmentResult};
pub use params::{SegmentationMethod, SegmentationParams};
pub use pipeline::{Segmentation, segment};
