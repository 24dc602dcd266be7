//! Watershed segmentation
//!
//! Floods an intensity grid level by level, growing catchment basins from
//! a seed set. Each undecided voxel looks at its 8 in-plane neighbors that
//! already carry a decision:
//!
//! - no labeled neighbor: a new basin is born;
//! - all labeled neighbors agree: the voxel joins that basin;
//! - they disagree: the voxel becomes a barrier (label 0).
//!
//! The [`WatershedStrategy::Seeded`] variant starts from caller-supplied
//! seed labels and floods in increasing intensity. There, disagreement only
//! forces a barrier when two distinct *seed* regions meet; any other
//! disagreement is recorded as a merge in an [`EquivalenceTable`] (smaller
//! label wins), so over-segmented basins are absorbed into the seed region
//! they touch. The [`WatershedStrategy::Unseeded`] variant inverts the
//! flooding order, so basins grow from the brightest voxels outward.
//!
//! Within one intensity level, voxels are decided breadth-first from the
//! regions that already reach the level; a new basin is only born once no
//! pending voxel of the level touches an existing basin.

use crate::conncomp::{Connectivity, neighbor, relabel_in_place};
use crate::error::RegionResult;
use cellseg_core::{Coord, EquivalenceTable, FloatGrid, LabelMap};
use log::debug;
use std::cmp::Ordering;
use std::collections::VecDeque;

const UNDECIDED: u32 = u32::MAX;

/// Where the flood starts
#[derive(Debug, Clone, Copy)]
pub enum WatershedStrategy<'a> {
    /// Invert the image and grow basins from its brightest levels
    Unseeded,
    /// Grow from the positive labels of a seed map (read-only)
    Seeded(&'a LabelMap),
}

impl WatershedStrategy<'_> {
    /// Largest seed label (0 when unseeded)
    pub fn max_seed_label(&self) -> u32 {
        match self {
            WatershedStrategy::Unseeded => 0,
            WatershedStrategy::Seeded(seeds) => seeds.max_label(),
        }
    }
}

/// Options for watershed segmentation
#[derive(Debug, Clone)]
pub struct WatershedOptions {
    /// Voxels with intensity `<= 0` (or NaN) stay background and are not flooded
    pub mask_background: bool,
}

impl Default for WatershedOptions {
    fn default() -> Self {
        Self {
            mask_background: true,
        }
    }
}

impl WatershedOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether non-positive voxels are treated as background
    pub fn with_mask_background(mut self, mask_background: bool) -> Self {
        self.mask_background = mask_background;
        self
    }
}

/// Perform watershed segmentation
///
/// Returns a label map where 0 marks barriers and background and positive
/// values are consecutive region labels. With a seeded strategy, only
/// regions that contain a seed (directly or through merges) survive.
///
/// # Errors
///
/// Returns an error if the seed map's shape differs from the image.
pub fn watershed(
    image: &FloatGrid,
    strategy: WatershedStrategy<'_>,
    options: &WatershedOptions,
) -> RegionResult<LabelMap> {
    if let WatershedStrategy::Seeded(seeds) = strategy {
        image.check_same_shape(seeds)?;
    }
    let max_seed = strategy.max_seed_label();
    let seeded = matches!(strategy, WatershedStrategy::Seeded(_));
    let bounds = image.active_bounds();

    let mut processing = LabelMap::new_like(image);
    let mut table = EquivalenceTable::with_labels(max_seed);
    let mut pending: Vec<Coord> = Vec::new();

    for c in image.coords() {
        if let WatershedStrategy::Seeded(seeds) = strategy {
            let s = seeds.get(c);
            if s > 0 {
                processing.set(c, s);
                continue;
            }
        }
        let v = image.get(c);
        if options.mask_background && (v.is_nan() || v <= 0.0) {
            continue;
        }
        processing.set(c, UNDECIDED);
        pending.push(c);
    }

    // Flooding order: stable, so raster order breaks ties within a level
    pending.sort_by(|&a, &b| {
        let (va, vb) = (image.get(a), image.get(b));
        if seeded {
            va.total_cmp(&vb)
        } else {
            vb.total_cmp(&va)
        }
    });

    let mut flood = Flood {
        image,
        processing: &mut processing,
        table: &mut table,
        bounds,
        max_seed,
        seeded,
        queued: vec![false; image.len()],
        born: 0,
        merges: 0,
        barriers: 0,
    };

    let mut start = 0;
    while start < pending.len() {
        let level = image.get(pending[start]);
        let mut end = start + 1;
        while end < pending.len() && image.get(pending[end]).total_cmp(&level) == Ordering::Equal {
            end += 1;
        }
        flood.flood_level(&pending[start..end], level);
        start = end;
    }

    let (born, merges, barriers) = (flood.born, flood.merges, flood.barriers);

    // Mask + label: resolve merges, drop undecided and orphan basins, compact
    for c in image.coords() {
        let l = processing.get(c);
        let resolved = if l == UNDECIDED || l == 0 {
            0
        } else {
            let root = table.find(l);
            if seeded && root > max_seed { 0 } else { root }
        };
        processing.set(c, resolved);
    }
    let regions = relabel_in_place(&mut processing);

    debug!(
        "watershed: {} basins born, {} merges, {} barrier voxels, {} regions",
        born, merges, barriers, regions
    );
    Ok(processing)
}

/// Unseeded watershed with default options
pub fn watershed_unseeded(image: &FloatGrid) -> RegionResult<LabelMap> {
    watershed(image, WatershedStrategy::Unseeded, &WatershedOptions::default())
}

/// Seeded watershed with default options
pub fn watershed_seeded(image: &FloatGrid, seeds: &LabelMap) -> RegionResult<LabelMap> {
    watershed(image, WatershedStrategy::Seeded(seeds), &WatershedOptions::default())
}

struct Flood<'a> {
    image: &'a FloatGrid,
    processing: &'a mut LabelMap,
    table: &'a mut EquivalenceTable,
    bounds: cellseg_core::BoundingBox,
    max_seed: u32,
    seeded: bool,
    queued: Vec<bool>,
    born: usize,
    merges: usize,
    barriers: usize,
}

impl Flood<'_> {
    fn neighbors(&self, c: Coord) -> impl Iterator<Item = Coord> + '_ {
        Connectivity::EightWay
            .offsets()
            .iter()
            .filter_map(move |&o| neighbor(c, o, &self.bounds))
    }

    fn is_labeled(l: u32) -> bool {
        l > 0 && l != UNDECIDED
    }

    fn has_labeled_neighbor(&self, c: Coord) -> bool {
        self.neighbors(c)
            .any(|n| Self::is_labeled(self.processing.get(n)))
    }

    /// Undecided neighbors of `c` at the current level, not yet queued
    fn push_level_neighbors(&mut self, c: Coord, level: f32, queue: &mut VecDeque<Coord>) {
        let found: Vec<Coord> = self
            .neighbors(c)
            .filter(|&n| {
                self.processing.get(n) == UNDECIDED
                    && !self.queued[self.image.index_of(n)]
                    && self.image.get(n).total_cmp(&level) == Ordering::Equal
            })
            .collect();
        for n in found {
            self.queued[self.image.index_of(n)] = true;
            queue.push_back(n);
        }
    }

    fn flood_level(&mut self, level_coords: &[Coord], level: f32) {
        let mut queue = VecDeque::new();
        for &c in level_coords {
            if self.has_labeled_neighbor(c) {
                self.queued[self.image.index_of(c)] = true;
                queue.push_back(c);
            }
        }

        let mut cursor = 0;
        loop {
            while let Some(c) = queue.pop_front() {
                let idx = self.image.index_of(c);
                self.queued[idx] = false;
                match self.decide(c) {
                    None => {}
                    Some(0) => self.processing.set(c, 0),
                    Some(l) => {
                        self.processing.set(c, l);
                        self.push_level_neighbors(c, level, &mut queue);
                    }
                }
            }

            while cursor < level_coords.len()
                && self.processing.get(level_coords[cursor]) != UNDECIDED
            {
                cursor += 1;
            }
            if cursor == level_coords.len() {
                break;
            }

            // Nothing of this level touches a basin: a new one is born
            let c = level_coords[cursor];
            let l = self.table.make_label();
            self.born += 1;
            self.processing.set(c, l);
            self.push_level_neighbors(c, level, &mut queue);
        }
    }

    /// Decision for `c`: `None` if no labeled neighbor, `Some(0)` for a barrier
    fn decide(&mut self, c: Coord) -> Option<u32> {
        let mut roots: Vec<u32> = Vec::with_capacity(8);
        let labels: Vec<u32> = self
            .neighbors(c)
            .map(|n| self.processing.get(n))
            .filter(|&l| Self::is_labeled(l))
            .collect();
        for l in labels {
            let r = self.table.find(l);
            if !roots.contains(&r) {
                roots.push(r);
            }
        }

        match roots.len() {
            0 => None,
            1 => Some(roots[0]),
            _ => {
                let seed_roots = roots.iter().filter(|&&r| r <= self.max_seed).count();
                if !self.seeded || seed_roots >= 2 {
                    self.barriers += 1;
                    return Some(0);
                }
                let mut root = roots[0];
                for &r in &roots[1..] {
                    root = self.table.union(root, r);
                    self.merges += 1;
                }
                Some(root)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conncomp::count_regions;

    fn row(values: &[f32]) -> FloatGrid {
        FloatGrid::from_data_2d(values.len(), 1, values.to_vec()).unwrap()
    }

    #[test]
    fn test_two_peaks_split_by_barrier() {
        let image = row(&[1.0, 5.0, 3.0, 2.0, 3.0, 6.0, 1.0]);
        let labels = watershed_unseeded(&image).unwrap();
        assert_eq!(count_regions(&labels), 2);
        assert_eq!(labels.get(Coord::new_2d(3, 0)), 0);
        assert_ne!(
            labels.get(Coord::new_2d(1, 0)),
            labels.get(Coord::new_2d(5, 0))
        );
    }

    #[test]
    fn test_background_stays_zero() {
        let image = row(&[0.0, 4.0, 4.0, 0.0]);
        let labels = watershed_unseeded(&image).unwrap();
        assert_eq!(labels.data(), &[0, 1, 1, 0]);
    }

    #[test]
    fn test_seeded_merges_non_seed_basins() {
        // Seed at x=0, a second local minimum at x=4 born as a non-seed basin
        let image = row(&[1.0, 2.0, 3.0, 2.5, 1.5, 2.0]);
        let seeds = LabelMap::from_data_2d(6, 1, vec![1, 0, 0, 0, 0, 0]).unwrap();
        let labels = watershed_seeded(&image, &seeds).unwrap();
        assert_eq!(labels.data(), &[1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_seeded_barrier_between_seeds() {
        let image = row(&[1.0, 2.0, 3.0, 2.0, 1.0]);
        let seeds = LabelMap::from_data_2d(5, 1, vec![1, 0, 0, 0, 2]).unwrap();
        let labels = watershed_seeded(&image, &seeds).unwrap();
        assert_eq!(labels.data(), &[1, 1, 0, 2, 2]);
    }

    #[test]
    fn test_seed_shape_mismatch() {
        let image = row(&[1.0, 2.0]);
        let seeds = LabelMap::new_2d(3, 1).unwrap();
        assert!(watershed_seeded(&image, &seeds).is_err());
    }
}
