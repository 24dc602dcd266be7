//! cellseg core - basic data structures for segmentation
//!
//! This crate provides the fundamental data structures used throughout
//! the cellseg toolkit:
//!
//! - [`Grid`] / [`FloatGrid`] / [`LabelMap`] - dense 2D/3D value grids
//! - [`Coord`] / [`Dim`] - voxel coordinates
//! - [`BoundingBox`] - sub-boxes for restricted iteration and region bounds
//! - [`Histogram`] - integer-bucketed intensity statistics
//! - [`EquivalenceTable`] - union-find over region labels
//!
//! All components are single-threaded and mutate grids in place. A caller
//! that needs a stable snapshot while another pass writes must clone the
//! grid first.

pub mod bounds;
pub mod coord;
pub mod error;
pub mod grid;
pub mod histogram;
pub mod union_find;

pub use bounds::BoundingBox;
pub use coord::{Coord, Dim};
pub use error::{Error, Result};
pub use grid::{CoordIter, FloatGrid, Grid, LabelMap};
pub use histogram::{Histogram, MAX_BUCKET};
pub use union_find::EquivalenceTable;
