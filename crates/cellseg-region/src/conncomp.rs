//! Connected component labeling
//!
//! Labels the positive-valued voxels of a grid so that two voxels share a
//! label exactly when a connectivity-respecting path of foreground voxels
//! joins them. Uses the [`EquivalenceTable`] union-find in three passes:
//!
//! 1. provisional labels, propagated from already-visited neighbors in
//!    raster order, a fresh label when none is labeled yet;
//! 2. equivalence resolution, uniting the roots of every pair of adjacent
//!    provisional labels (smaller root wins);
//! 3. every voxel is resolved to its root and the result is compacted by
//!    [`relabel`].
//!
//! 2D grids are labeled with 8-connectivity and 3D grids with
//! 6-connectivity (see [`Connectivity::for_grid`]). The asymmetry is kept
//! because downstream results depend on it.

use cellseg_core::{BoundingBox, Coord, EquivalenceTable, Grid, LabelMap};
use std::collections::HashMap;

/// Neighborhood used when deciding whether two voxels touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// 8 neighbors in the same plane (edges and corners)
    #[default]
    EightWay,
    /// 6 axis-aligned neighbors, across planes included
    SixWay,
}

const EIGHT_WAY: [(isize, isize, isize); 8] = [
    (-1, -1, 0),
    (0, -1, 0),
    (1, -1, 0),
    (-1, 0, 0),
    (1, 0, 0),
    (-1, 1, 0),
    (0, 1, 0),
    (1, 1, 0),
];

const SIX_WAY: [(isize, isize, isize); 6] = [
    (0, 0, -1),
    (0, -1, 0),
    (-1, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
];

impl Connectivity {
    /// Default connectivity for a grid: 8-way in 2D, 6-way in 3D
    pub fn for_grid<T>(grid: &Grid<T>) -> Self
    where
        T: Copy + Default,
    {
        if grid.is_3d() {
            Connectivity::SixWay
        } else {
            Connectivity::EightWay
        }
    }

    /// All neighbor offsets `(dx, dy, dz)`
    pub fn offsets(self) -> &'static [(isize, isize, isize)] {
        match self {
            Connectivity::EightWay => &EIGHT_WAY,
            Connectivity::SixWay => &SIX_WAY,
        }
    }

    /// Offsets of the neighbors that precede a voxel in raster order
    pub fn backward_offsets(self) -> &'static [(isize, isize, isize)] {
        match self {
            Connectivity::EightWay => &EIGHT_WAY[..4],
            Connectivity::SixWay => &SIX_WAY[..3],
        }
    }
}

/// Neighbor of `c` at `offset`, if it lies inside `bounds`
#[inline]
pub(crate) fn neighbor(
    c: Coord,
    (dx, dy, dz): (isize, isize, isize),
    bounds: &BoundingBox,
) -> Option<Coord> {
    c.offset(dx, dy, dz).filter(|n| bounds.contains(*n))
}

/// Label the connected foreground components of `mask`
///
/// Foreground is every value greater than `T::default()`. Connectivity is
/// chosen by [`Connectivity::for_grid`]. The returned labels are
/// consecutive, starting at 1 in raster order of first appearance.
/// A mask without foreground yields an all-zero map.
pub fn label<T>(mask: &Grid<T>) -> LabelMap
where
    T: Copy + Default + PartialOrd,
{
    label_with(mask, Connectivity::for_grid(mask))
}

/// Label connected components with an explicit connectivity
///
/// Only the mask's active region is labeled; voxels outside it are 0 in
/// the result and never connect anything.
pub fn label_with<T>(mask: &Grid<T>, connectivity: Connectivity) -> LabelMap
where
    T: Copy + Default + PartialOrd,
{
    let bounds = mask.active_bounds();
    let mut labels = LabelMap::new_like(mask);
    let mut table = EquivalenceTable::new();

    // Provisional pass: first labeled predecessor wins
    for c in mask.coords() {
        if !mask.is_foreground(c) {
            continue;
        }
        let inherited = connectivity
            .backward_offsets()
            .iter()
            .filter_map(|&o| neighbor(c, o, &bounds))
            .map(|n| labels.get(n))
            .find(|&l| l > 0);
        let provisional = match inherited {
            Some(l) => l,
            None => table.make_label(),
        };
        labels.set(c, provisional);
    }

    // Equivalence pass
    for c in mask.coords() {
        let l = labels.get(c);
        if l == 0 {
            continue;
        }
        for &o in connectivity.offsets() {
            if let Some(n) = neighbor(c, o, &bounds) {
                let ln = labels.get(n);
                if ln > 0 && !table.same_set(l, ln) {
                    table.union(l, ln);
                }
            }
        }
    }

    for c in mask.coords() {
        let l = labels.get(c);
        if l > 0 {
            labels.set(c, table.find(l));
        }
    }

    relabel_in_place(&mut labels);
    labels
}

/// Compact labels to `1..=N` in first-seen raster order
///
/// 0 stays 0. Returns a new map; see [`relabel_in_place`].
pub fn relabel(labels: &LabelMap) -> LabelMap {
    let mut out = labels.clone();
    relabel_in_place(&mut out);
    out
}

/// Compact labels in place, returning the number of regions `N`
///
/// The whole grid is rewritten, ignoring any region of interest, so
/// labels outside it never share a number with a different region inside.
pub fn relabel_in_place(labels: &mut LabelMap) -> u32 {
    let mut mapping: HashMap<u32, u32> = HashMap::new();
    let mut next = 0u32;
    for l in labels.data_mut().iter_mut().filter(|l| **l != 0) {
        *l = *mapping.entry(*l).or_insert_with(|| {
            next += 1;
            next
        });
    }
    next
}

/// Merge existing labels that touch under 8-connectivity
///
/// Adjacent voxels with different labels have their labels united
/// (smaller wins) and every voxel is rewritten to its root label. Label
/// numbers are not compacted; call [`relabel`] for that.
pub fn merge(labels: &LabelMap) -> LabelMap {
    merge_with(labels, Connectivity::EightWay)
}

/// Merge touching labels with an explicit connectivity
pub fn merge_with(labels: &LabelMap, connectivity: Connectivity) -> LabelMap {
    let bounds = labels.active_bounds();
    let mut table = EquivalenceTable::with_labels(labels.max_label());

    for c in labels.coords() {
        let l = labels.get(c);
        if l == 0 {
            continue;
        }
        for &o in connectivity.offsets() {
            if let Some(n) = neighbor(c, o, &bounds) {
                let ln = labels.get(n);
                if ln > 0 && ln != l {
                    table.union(l, ln);
                }
            }
        }
    }

    let mut out = labels.clone();
    for c in labels.coords() {
        let l = labels.get(c);
        if l > 0 {
            out.set(c, table.find(l));
        }
    }
    out
}

/// Number of distinct nonzero labels in the active region
pub fn count_regions(labels: &LabelMap) -> usize {
    let mut seen = std::collections::HashSet::new();
    for c in labels.coords() {
        let l = labels.get(c);
        if l > 0 {
            seen.insert(l);
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellseg_core::FloatGrid;

    fn mask(width: usize, height: usize, pixels: &[(usize, usize)]) -> FloatGrid {
        let mut g = FloatGrid::new_2d(width, height).unwrap();
        for &(x, y) in pixels {
            g.set(Coord::new_2d(x, y), 1.0);
        }
        g
    }

    #[test]
    fn test_label_empty() {
        let labels = label(&mask(5, 5, &[]));
        assert_eq!(labels.max_label(), 0);
        assert_eq!(count_regions(&labels), 0);
    }

    #[test]
    fn test_label_diagonal_is_connected_in_2d() {
        let labels = label(&mask(4, 4, &[(0, 0), (1, 1), (3, 3)]));
        assert_eq!(labels.get(Coord::new_2d(0, 0)), 1);
        assert_eq!(labels.get(Coord::new_2d(1, 1)), 1);
        assert_eq!(labels.get(Coord::new_2d(3, 3)), 2);
    }

    #[test]
    fn test_label_u_shape_merges() {
        // The two arms get different provisional labels until the bottom row
        let g = mask(
            5,
            3,
            &[(0, 0), (4, 0), (0, 1), (4, 1), (0, 2), (1, 2), (2, 2), (3, 2), (4, 2)],
        );
        let labels = label(&g);
        assert_eq!(count_regions(&labels), 1);
        assert_eq!(labels.max_label(), 1);
    }

    #[test]
    fn test_label_3d_uses_six_way() {
        let mut g = FloatGrid::new(3, 3, 2).unwrap();
        g.set(Coord::new(0, 0, 0), 1.0);
        g.set(Coord::new(1, 1, 0), 1.0); // diagonal only: separate in 3D
        g.set(Coord::new(1, 1, 1), 1.0); // directly above: same region
        let labels = label(&g);
        assert_eq!(count_regions(&labels), 2);
        assert_eq!(
            labels.get(Coord::new(1, 1, 0)),
            labels.get(Coord::new(1, 1, 1))
        );
    }

    #[test]
    fn test_relabel_first_seen_order() {
        let l = LabelMap::from_data_2d(5, 1, vec![9, 0, 4, 9, 2]).unwrap();
        let r = relabel(&l);
        assert_eq!(r.data(), &[1, 0, 2, 1, 3]);
    }

    #[test]
    fn test_relabel_ignores_roi() {
        let mut labels = LabelMap::from_data_2d(4, 1, vec![5, 0, 7, 5]).unwrap();
        labels.set_roi(Some(BoundingBox::new_2d(2, 0, 2, 1))).unwrap();
        assert_eq!(relabel_in_place(&mut labels), 2);
        assert_eq!(labels.data(), &[1, 0, 2, 1]);
    }

    #[test]
    fn test_merge_touching_labels() {
        let l = LabelMap::from_data_2d(4, 2, vec![3, 0, 0, 5, 0, 3, 5, 0]).unwrap();
        let m = merge(&l);
        assert_eq!(m.data(), &[3, 0, 0, 3, 0, 3, 3, 0]);
    }

    #[test]
    fn test_label_respects_roi() {
        let mut g = mask(6, 1, &[(0, 0), (1, 0), (2, 0), (3, 0)]);
        g.set_roi(Some(BoundingBox::new_2d(2, 0, 4, 1))).unwrap();
        let labels = label(&g);
        assert_eq!(labels.data(), &[0, 0, 1, 1, 0, 0]);
    }
}
