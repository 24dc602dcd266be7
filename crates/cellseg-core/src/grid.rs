//! Grid - dense 2D/3D array of scalar values
//!
//! `Grid<T>` is the pixel container shared by every component of the
//! toolkit. Intensity images are [`FloatGrid`]s and region labelings are
//! [`LabelMap`]s; both have the same shape rules and iteration order.
//!
//! # Memory Layout
//!
//! Data is stored plane by plane, row by row, with no padding. The voxel
//! at `(x, y, z)` is at index `(z * height + y) * width + x`.
//!
//! # Box of interest
//!
//! A grid may carry an optional [`BoundingBox`] restricting iteration
//! (see [`Grid::coords`]). Accessors still address the whole grid; only
//! iteration, and therefore every algorithm that walks the grid, is
//! restricted.
//!
//! # Examples
//!
//! ```
//! use cellseg_core::{Coord, FloatGrid};
//!
//! let mut grid = FloatGrid::new_2d(100, 100).unwrap();
//! grid.set(Coord::new_2d(10, 20), 0.5);
//! assert_eq!(grid.get(Coord::new_2d(10, 20)), 0.5);
//! assert!(!grid.in_bounds(Coord::new_2d(100, 0)));
//! ```

use crate::bounds::BoundingBox;
use crate::coord::{Coord, Dim};
use crate::error::{Error, Result};

/// Dense grid of `T` values addressed by [`Coord`]
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    depth: usize,
    data: Vec<T>,
    roi: Option<BoundingBox>,
}

/// Grid of intensity values
pub type FloatGrid = Grid<f32>;

/// Grid of region labels, 0 meaning background / barrier
pub type LabelMap = Grid<u32>;

impl<T> Grid<T> {
    /// Get the grid width
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get the grid height
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the number of planes
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Size along every dimension as `[width, height, depth]`
    #[inline]
    pub fn dimensions(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    /// Size along one dimension
    #[inline]
    pub fn size(&self, dim: Dim) -> usize {
        self.dimensions()[dim.index()]
    }

    /// Total number of voxels
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; grids have at least one voxel
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True if the grid has more than one plane
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// True if both grids have identical dimensions
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.dimensions() == other.dimensions()
    }

    /// Check that `other` has the same dimensions as `self`
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` otherwise.
    pub fn check_same_shape<U>(&self, other: &Grid<U>) -> Result<()> {
        if !self.same_shape(other) {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        Ok(())
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Create a new grid with all values set to `T::default()`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if any extent is 0.
    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self> {
        Self::new_with_value(width, height, depth, T::default())
    }

    /// Create a new single-plane grid
    pub fn new_2d(width: usize, height: usize) -> Result<Self> {
        Self::new(width, height, 1)
    }

    /// Create a new grid with every value set to `value`
    pub fn new_with_value(width: usize, height: usize, depth: usize, value: T) -> Result<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(Error::InvalidDimension {
                width,
                height,
                depth,
            });
        }
        Ok(Grid {
            width,
            height,
            depth,
            data: vec![value; width * height * depth],
            roi: None,
        })
    }

    /// Create a grid from raw data in storage order
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or data length doesn't match.
    pub fn from_data(width: usize, height: usize, depth: usize, data: Vec<T>) -> Result<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(Error::InvalidDimension {
                width,
                height,
                depth,
            });
        }
        if data.len() != width * height * depth {
            return Err(Error::DataLength {
                len: data.len(),
                width,
                height,
                depth,
            });
        }
        Ok(Grid {
            width,
            height,
            depth,
            data,
            roi: None,
        })
    }

    /// Create a single-plane grid from row-major data
    pub fn from_data_2d(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        Self::from_data(width, height, 1, data)
    }

    /// Create a grid with the same shape as `other`, filled with defaults
    pub fn new_like<U>(other: &Grid<U>) -> Self {
        Grid {
            width: other.width,
            height: other.height,
            depth: other.depth,
            data: vec![T::default(); other.data.len()],
            roi: other.roi,
        }
    }

    /// Check that `c` addresses a voxel of this grid
    #[inline]
    pub fn in_bounds(&self, c: Coord) -> bool {
        c.x < self.width && c.y < self.height && c.z < self.depth
    }

    /// Linear storage index of a coordinate
    ///
    /// The coordinate must be in bounds; no check is performed.
    #[inline]
    pub fn index_of(&self, c: Coord) -> usize {
        (c.z * self.height + c.y) * self.width + c.x
    }

    /// Coordinate of a linear storage index
    #[inline]
    pub fn coord_of(&self, index: usize) -> Coord {
        let plane = self.width * self.height;
        let z = index / plane;
        let rem = index % plane;
        Coord::new(rem % self.width, rem / self.width, z)
    }

    /// Get the value at `c` without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if the resulting index is outside the storage. A coordinate
    /// that is out of range along x or y but still inside the storage
    /// aliases another voxel; check [`in_bounds`](Self::in_bounds) first.
    #[inline]
    pub fn get(&self, c: Coord) -> T {
        self.data[self.index_of(c)]
    }

    /// Set the value at `c` without bounds checking
    ///
    /// # Panics
    ///
    /// Same contract as [`get`](Self::get).
    #[inline]
    pub fn set(&mut self, c: Coord, value: T) {
        let idx = self.index_of(c);
        self.data[idx] = value;
    }

    /// Get the value at `c`, or `None` if it is out of bounds
    #[inline]
    pub fn get_checked(&self, c: Coord) -> Option<T> {
        if self.in_bounds(c) {
            Some(self.get(c))
        } else {
            None
        }
    }

    /// Set the value at `c`
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfBounds` if `c` is outside the grid.
    pub fn set_checked(&mut self, c: Coord, value: T) -> Result<()> {
        if !self.in_bounds(c) {
            return Err(Error::OutOfBounds {
                x: c.x,
                y: c.y,
                z: c.z,
            });
        }
        self.set(c, value);
        Ok(())
    }

    /// Get raw access to the data in storage order
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Get mutable access to the data in storage order
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the grid, returning its data
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Set every value
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Box covering the whole grid
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            x: 0,
            y: 0,
            z: 0,
            w: self.width,
            h: self.height,
            d: self.depth,
        }
    }

    /// The restricted iteration box, if any
    #[inline]
    pub fn roi(&self) -> Option<BoundingBox> {
        self.roi
    }

    /// Box iterated by [`coords`](Self::coords): the roi, or the whole grid
    #[inline]
    pub fn active_bounds(&self) -> BoundingBox {
        self.roi.unwrap_or_else(|| self.bounds())
    }

    /// Restrict (or, with `None`, unrestrict) iteration to a sub-box
    ///
    /// # Errors
    ///
    /// Returns `Error::BoxOutOfBounds` if the box is empty or not fully
    /// inside the grid.
    pub fn set_roi(&mut self, roi: Option<BoundingBox>) -> Result<()> {
        if let Some(b) = roi {
            if b.is_empty() || !self.bounds().contains_box(&b) {
                return Err(Error::BoxOutOfBounds(b.to_string()));
            }
        }
        self.roi = roi;
        Ok(())
    }

    /// Iterate the active region in raster order (z, then y, then x)
    pub fn coords(&self) -> CoordIter {
        CoordIter::new(self.active_bounds())
    }

    /// Copy a sub-box into a new grid
    ///
    /// The result has no roi; its origin is the box's lower corner.
    ///
    /// # Errors
    ///
    /// Returns `Error::BoxOutOfBounds` if the box is not inside the grid.
    pub fn crop(&self, b: &BoundingBox) -> Result<Self> {
        if b.is_empty() || !self.bounds().contains_box(b) {
            return Err(Error::BoxOutOfBounds(b.to_string()));
        }
        let mut data = Vec::with_capacity(b.volume());
        for z in b.z..b.back() {
            for y in b.y..b.bottom() {
                let start = self.index_of(Coord::new(b.x, y, z));
                data.extend_from_slice(&self.data[start..start + b.w]);
            }
        }
        Self::from_data(b.w, b.h, b.d, data)
    }

    /// Apply `f` to every value, producing a grid of the same shape
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: FnMut(T) -> U,
    {
        Grid {
            width: self.width,
            height: self.height,
            depth: self.depth,
            data: self.data.iter().copied().map(f).collect(),
            roi: self.roi,
        }
    }
}

impl<T: Copy + Default + PartialOrd> Grid<T> {
    /// True if the value at `c` is positive
    #[inline]
    pub fn is_foreground(&self, c: Coord) -> bool {
        self.get(c) > T::default()
    }

    /// Number of positive values in the active region
    pub fn count_foreground(&self) -> usize {
        self.coords().filter(|&c| self.is_foreground(c)).count()
    }
}

impl FloatGrid {
    /// Minimum and maximum value over the active region
    ///
    /// NaN values are ignored. Returns `None` if every value is NaN.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut result: Option<(f32, f32)> = None;
        for c in self.coords() {
            let v = self.get(c);
            if v.is_nan() {
                continue;
            }
            result = Some(match result {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        result
    }
}

impl LabelMap {
    /// Largest label in the active region (0 if there is none)
    pub fn max_label(&self) -> u32 {
        self.coords().map(|c| self.get(c)).max().unwrap_or(0)
    }
}

/// Raster-order iterator over the voxels of a [`BoundingBox`]
#[derive(Debug, Clone)]
pub struct CoordIter {
    bounds: BoundingBox,
    next: Option<Coord>,
}

impl CoordIter {
    /// Iterate every coordinate inside `bounds`
    pub fn new(bounds: BoundingBox) -> Self {
        let next = if bounds.is_empty() {
            None
        } else {
            Some(bounds.lower())
        };
        Self { bounds, next }
    }
}

impl Iterator for CoordIter {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        let current = self.next?;
        let b = &self.bounds;
        let mut n = current;
        n.x += 1;
        if n.x == b.right() {
            n.x = b.x;
            n.y += 1;
            if n.y == b.bottom() {
                n.y = b.y;
                n.z += 1;
            }
        }
        self.next = if n.z == b.back() { None } else { Some(n) };
        Some(current)
    }
}
