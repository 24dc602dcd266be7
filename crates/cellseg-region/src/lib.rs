//! cellseg-region - Region labeling for cellseg
//!
//! This crate turns foreground masks and intensity grids into label maps:
//!
//! - **Connected component labeling** - union-find labeling, relabeling and merging
//! - **Region utilities** - per-region statistics, size filtering, masking
//! - **Watershed segmentation** - seeded and unseeded flooding with barriers
//!
//! # Examples
//!
//! ## Labeling a mask
//!
//! ```
//! use cellseg_core::{Coord, FloatGrid};
//! use cellseg_region::{count_regions, label};
//!
//! let mut mask = FloatGrid::new_2d(10, 10).unwrap();
//! mask.set(Coord::new_2d(1, 1), 1.0);
//! mask.set(Coord::new_2d(2, 2), 1.0);
//! mask.set(Coord::new_2d(7, 7), 1.0);
//!
//! let labels = label(&mask);
//! assert_eq!(count_regions(&labels), 2);
//! ```
//!
//! ## Watershed segmentation
//!
//! ```
//! use cellseg_core::FloatGrid;
//! use cellseg_region::{WatershedOptions, WatershedStrategy, watershed};
//!
//! let image = FloatGrid::from_data_2d(5, 1, vec![1.0, 4.0, 2.0, 5.0, 1.0]).unwrap();
//! let labels = watershed(&image, WatershedStrategy::Unseeded, &WatershedOptions::default()).unwrap();
//! assert_eq!(labels.data()[2], 0);
//! ```

pub mod conncomp;
pub mod error;
pub mod label;
pub mod watershed;

// Re-export core types
pub use cellseg_core;

// Re-export error types
pub use error::{RegionError, RegionResult};

// Re-export conncomp types and functions
pub use conncomp::{
    Connectivity, count_regions, label, label_with, merge, merge_with, relabel, relabel_in_place,
};

// Re-export label types and functions
pub use label::{
    ComponentStats, apply_mask, component_sizes, component_stats, filter_by_size, mask_from_labels,
};

// Re-export watershed types and functions
pub use watershed::{
    WatershedOptions, WatershedStrategy, watershed, watershed_seeded, watershed_unseeded,
};
