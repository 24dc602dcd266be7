//! Grid coordinates
//!
//! A [`Coord`] is a plain `Copy` value addressing one voxel of a
//! [`Grid`](crate::Grid). Coordinates are created on the stack wherever
//! they are needed; nothing is pooled or shared.

use std::fmt;

/// Named grid dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Column index
    X,
    /// Row index
    Y,
    /// Plane index (1 for 2D grids)
    Z,
}

impl Dim {
    /// All dimensions in storage order, fastest varying first
    pub const ALL: [Dim; 3] = [Dim::X, Dim::Y, Dim::Z];

    /// Position of this dimension in `[x, y, z]` arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Dim::X => 0,
            Dim::Y => 1,
            Dim::Z => 2,
        }
    }
}

/// A voxel position `(x, y, z)`
///
/// 2D grids always use `z = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Coord {
    /// Plane index
    pub z: usize,
    /// Row index
    pub y: usize,
    /// Column index
    pub x: usize,
}

impl Coord {
    /// Create a 3D coordinate
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { z, y, x }
    }

    /// Create a coordinate in the first plane
    #[inline]
    pub const fn new_2d(x: usize, y: usize) -> Self {
        Self { z: 0, y, x }
    }

    /// Get the index along a dimension
    #[inline]
    pub fn get(&self, dim: Dim) -> usize {
        match dim {
            Dim::X => self.x,
            Dim::Y => self.y,
            Dim::Z => self.z,
        }
    }

    /// Set the index along a dimension
    #[inline]
    pub fn set(&mut self, dim: Dim, value: usize) {
        match dim {
            Dim::X => self.x = value,
            Dim::Y => self.y = value,
            Dim::Z => self.z = value,
        }
    }

    /// Offset this coordinate by a signed step
    ///
    /// Returns `None` when any component would become negative. Upper
    /// bounds are not checked here; use [`Grid::in_bounds`](crate::Grid::in_bounds).
    #[inline]
    pub fn offset(&self, dx: isize, dy: isize, dz: isize) -> Option<Coord> {
        Some(Coord {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
            z: self.z.checked_add_signed(dz)?,
        })
    }

    /// Components as `[x, y, z]`
    #[inline]
    pub fn to_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<(usize, usize)> for Coord {
    fn from((x, y): (usize, usize)) -> Self {
        Coord::new_2d(x, y)
    }
}

impl From<(usize, usize, usize)> for Coord {
    fn from((x, y, z): (usize, usize, usize)) -> Self {
        Coord::new(x, y, z)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        let c = Coord::new(1, 0, 2);
        assert_eq!(c.offset(-1, 1, 0), Some(Coord::new(0, 1, 2)));
        assert_eq!(c.offset(0, -1, 0), None);
    }

    #[test]
    fn test_get_set() {
        let mut c = Coord::new_2d(3, 4);
        assert_eq!(c.get(Dim::Y), 4);
        c.set(Dim::Z, 7);
        assert_eq!(c.to_array(), [3, 4, 7]);
    }

    #[test]
    fn test_raster_ordering() {
        // z is the slowest varying component, x the fastest
        assert!(Coord::new(9, 0, 0) < Coord::new(0, 1, 0));
        assert!(Coord::new(9, 9, 0) < Coord::new(0, 0, 1));
    }
}
