//! BoundingBox - axis-aligned sub-box of a grid
//!
//! Used both as a grid's restricted iteration region ("box of interest")
//! and as the bounding box of a labeled region.

use crate::coord::Coord;
use crate::error::{Error, Result};
use std::fmt;

/// An axis-aligned box with inclusive lower and exclusive upper corner
///
/// A small `Copy` type, like every other coordinate value in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundingBox {
    /// Left x coordinate
    pub x: usize,
    /// Top y coordinate
    pub y: usize,
    /// Front z coordinate
    pub z: usize,
    /// Width
    pub w: usize,
    /// Height
    pub h: usize,
    /// Depth
    pub d: usize,
}

impl BoundingBox {
    /// Create a new box
    ///
    /// # Errors
    ///
    /// Returns an error if any extent is zero.
    pub fn new(x: usize, y: usize, z: usize, w: usize, h: usize, d: usize) -> Result<Self> {
        if w == 0 || h == 0 || d == 0 {
            return Err(Error::InvalidParameter(format!(
                "box extents must be positive: w={}, h={}, d={}",
                w, h, d
            )));
        }
        Ok(Self { x, y, z, w, h, d })
    }

    /// Create a single-plane box without validation
    pub const fn new_2d(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self {
            x,
            y,
            z: 0,
            w,
            h,
            d: 1,
        }
    }

    /// Create a box from inclusive lower and exclusive upper corners
    pub fn from_corners(lower: Coord, upper: Coord) -> Self {
        Self {
            x: lower.x,
            y: lower.y,
            z: lower.z,
            w: upper.x.saturating_sub(lower.x),
            h: upper.y.saturating_sub(lower.y),
            d: upper.z.saturating_sub(lower.z),
        }
    }

    /// A box containing exactly one voxel
    pub fn from_point(c: Coord) -> Self {
        Self {
            x: c.x,
            y: c.y,
            z: c.z,
            w: 1,
            h: 1,
            d: 1,
        }
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> usize {
        self.x + self.w
    }

    /// Get the bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> usize {
        self.y + self.h
    }

    /// Get the back z coordinate (exclusive)
    #[inline]
    pub fn back(&self) -> usize {
        self.z + self.d
    }

    /// Inclusive lower corner
    #[inline]
    pub fn lower(&self) -> Coord {
        Coord::new(self.x, self.y, self.z)
    }

    /// Exclusive upper corner
    #[inline]
    pub fn upper(&self) -> Coord {
        Coord::new(self.right(), self.bottom(), self.back())
    }

    /// Number of voxels in the box
    #[inline]
    pub fn volume(&self) -> usize {
        self.w * self.h * self.d
    }

    /// Check if the box is empty (zero volume)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Check if a coordinate is inside the box
    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        c.x >= self.x
            && c.x < self.right()
            && c.y >= self.y
            && c.y < self.bottom()
            && c.z >= self.z
            && c.z < self.back()
    }

    /// Check if this box contains another box
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.z >= self.z
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
            && other.back() <= self.back()
    }

    /// Grow the box so that it contains `c`
    ///
    /// An empty box becomes the single-voxel box at `c`.
    pub fn expand_to_contain(&mut self, c: Coord) {
        if self.is_empty() {
            *self = Self::from_point(c);
            return;
        }
        let (x1, y1, z1) = (
            self.right().max(c.x + 1),
            self.bottom().max(c.y + 1),
            self.back().max(c.z + 1),
        );
        self.x = self.x.min(c.x);
        self.y = self.y.min(c.y);
        self.z = self.z.min(c.z);
        self.w = x1 - self.x;
        self.h = y1 - self.y;
        self.d = z1 - self.z;
    }

    /// Intersection of two boxes, `None` if they do not overlap
    pub fn intersect(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let z0 = self.z.max(other.z);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        let z1 = self.back().min(other.back());
        if x0 >= x1 || y0 >= y1 || z0 >= z1 {
            return None;
        }
        Some(BoundingBox::from_corners(
            Coord::new(x0, y0, z0),
            Coord::new(x1, y1, z1),
        ))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}, {}..{}, {}..{}]",
            self.x,
            self.right(),
            self.y,
            self.bottom(),
            self.z,
            self.back()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty() {
        assert!(BoundingBox::new(0, 0, 0, 0, 1, 1).is_err());
        assert!(BoundingBox::new(0, 0, 0, 1, 1, 1).is_ok());
    }

    #[test]
    fn test_expand_to_contain() {
        let mut b = BoundingBox::default();
        b.expand_to_contain(Coord::new_2d(3, 4));
        assert_eq!(b, BoundingBox::new_2d(3, 4, 1, 1));
        b.expand_to_contain(Coord::new_2d(1, 6));
        assert_eq!(b, BoundingBox::new_2d(1, 4, 3, 3));
        assert!(b.contains(Coord::new_2d(2, 5)));
        assert!(!b.contains(Coord::new_2d(4, 5)));
    }

    #[test]
    fn test_intersect() {
        let a = BoundingBox::new_2d(0, 0, 5, 5);
        let b = BoundingBox::new_2d(3, 3, 5, 5);
        assert_eq!(a.intersect(&b), Some(BoundingBox::new_2d(3, 3, 2, 2)));
        let c = BoundingBox::new_2d(5, 0, 2, 2);
        assert_eq!(a.intersect(&c), None);
    }
}
