//! Rank filtering with a sliding histogram
//!
//! Computes, for every voxel, the value at a given rank (0.0 = min,
//! 0.5 = median, 1.0 = max) of the `(2b+1)` wide window around it. In 2D
//! the window is a `(2b+1)x(2b+1)` square; in 3D it is a cube.
//!
//! The grid is swept column by column. Each column keeps a circular buffer
//! of the `2b+1` window rows it currently covers together with the counts
//! of all values in the window, so moving the window down one row costs
//! one row in and one row out. The current rank value and the number of
//! window values strictly below it are carried from row to row and only
//! walked up or down as far as the new window requires.
//!
//! Values are bucketed by truncation to integers, the same way as
//! [`Histogram`](cellseg_core::Histogram) does, so values above
//! [`MAX_BUCKET`](cellseg_core::MAX_BUCKET) saturate. Negative, NaN and
//! infinite values, the padding around the grid, and voxels outside the
//! active region are absent and never counted.
//!
//! With [`BoxCount::Nominal`] (the default) the target rank is taken from
//! the full window size even where the window hangs over the grid edge, so
//! near borders the result leans towards the window maximum.
//! [`BoxCount::Present`] takes the rank among the values really present.

use crate::error::{FilterError, FilterResult};
use cellseg_core::histogram::bucket;
use cellseg_core::{Coord, FloatGrid};
use log::debug;

const ABSENT: u32 = u32::MAX;

/// How many values the target rank is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxCount {
    /// Full window size, regardless of absent voxels
    #[default]
    Nominal,
    /// Values actually present in the window
    Present,
}

/// Options for rank filtering
#[derive(Debug, Clone)]
pub struct RankFilterOptions {
    /// Window radius `b`
    pub radius: usize,
    /// Rank in `[0, 1]`
    pub rank: f64,
    /// Window count used for the target rank
    pub box_count: BoxCount,
}

impl Default for RankFilterOptions {
    fn default() -> Self {
        Self {
            radius: 1,
            rank: 0.5,
            box_count: BoxCount::Nominal,
        }
    }
}

impl RankFilterOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window radius
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Set the rank
    pub fn with_rank(mut self, rank: f64) -> Self {
        self.rank = rank;
        self
    }

    /// Set the window count mode
    pub fn with_box_count(mut self, box_count: BoxCount) -> Self {
        self.box_count = box_count;
        self
    }
}

/// Window counts for one column sweep
struct Window {
    counts: Vec<u32>,
    present: usize,
    current: usize,
    below: usize,
}

impl Window {
    fn add(&mut self, v: u32) {
        self.counts[v as usize] += 1;
        self.present += 1;
        if (v as usize) < self.current {
            self.below += 1;
        }
    }

    fn remove(&mut self, v: u32) {
        self.counts[v as usize] -= 1;
        self.present -= 1;
        if (v as usize) < self.current {
            self.below -= 1;
        }
    }

    /// Move `current` to the value at 0-based position `target`
    fn rebalance(&mut self, target: usize) -> Option<u32> {
        if self.present == 0 {
            return None;
        }
        let target = target.min(self.present - 1);
        while self.below > target {
            self.current -= 1;
            self.below -= self.counts[self.current] as usize;
        }
        while self.below + self.counts[self.current] as usize <= target {
            self.below += self.counts[self.current] as usize;
            self.current += 1;
        }
        Some(self.current as u32)
    }
}

/// Apply a rank filter to `image`
///
/// Voxels outside the active region are copied unchanged. A window with
/// no present value yields 0.
///
/// # Errors
///
/// Returns `FilterError::InvalidParameters` if `rank` is outside `[0, 1]`.
pub fn rank_filter(image: &FloatGrid, options: &RankFilterOptions) -> FilterResult<FloatGrid> {
    if !(0.0..=1.0).contains(&options.rank) {
        return Err(FilterError::InvalidParameters(format!(
            "rank must be in [0, 1], got {}",
            options.rank
        )));
    }

    let b = options.radius;
    let bz = if image.is_3d() { b } else { 0 };
    let [w, h, d] = image.dimensions();
    let (pw, ph, pd) = (w + 2 * b, h + 2 * b, d + 2 * bz);
    let bounds = image.active_bounds();

    let mut padded = vec![ABSENT; pw * ph * pd];
    let mut max_bucket = 0u32;
    for c in image.coords() {
        let v = bucket(image.get(c)).unwrap_or(ABSENT);
        if v != ABSENT {
            max_bucket = max_bucket.max(v);
        }
        padded[((c.z + bz) * ph + c.y + b) * pw + c.x + b] = v;
    }
    debug!(
        "rank filter: radius {}, rank {}, {} buckets",
        b,
        options.rank,
        max_bucket as usize + 1
    );

    let span = 2 * b + 1;
    let nominal = span * span * (2 * bz + 1);
    let target = |present: usize| {
        let n = match options.box_count {
            BoxCount::Nominal => nominal,
            BoxCount::Present => present,
        };
        ((options.rank * n as f64).floor() as usize).min(n.saturating_sub(1))
    };

    // Present values of padded row `py` in the window of column (x, z)
    let row_values = |x: usize, py: usize, z: usize| -> Vec<u32> {
        let mut out = Vec::with_capacity(span * (2 * bz + 1));
        for pz in z..=z + 2 * bz {
            let start = (pz * ph + py) * pw + x;
            out.extend(padded[start..start + span].iter().filter(|&&v| v != ABSENT));
        }
        out
    };

    let mut out = image.clone();
    let mut window = Window {
        counts: vec![0; max_bucket as usize + 1],
        present: 0,
        current: 0,
        below: 0,
    };
    let mut rows: Vec<Vec<u32>> = vec![Vec::new(); span];

    for z in bounds.z..bounds.back() {
        for x in bounds.x..bounds.right() {
            // Forget the previous column
            for row in rows.iter_mut() {
                for &v in row.iter() {
                    window.remove(v);
                }
                row.clear();
            }
            window.current = 0;
            window.below = 0;

            let y0 = bounds.y;
            for (slot, py) in (y0..y0 + span).enumerate() {
                rows[slot] = row_values(x, py, z);
                for &v in &rows[slot] {
                    window.add(v);
                }
            }

            for y in y0..bounds.bottom() {
                if y > y0 {
                    // Row y - 1 - b leaves, row y + b enters; both map to the same slot
                    let slot = (y - 1 - y0) % span;
                    for &v in &rows[slot] {
                        window.remove(v);
                    }
                    rows[slot] = row_values(x, y + 2 * b, z);
                    for &v in &rows[slot] {
                        window.add(v);
                    }
                }
                let value = window
                    .rebalance(target(window.present))
                    .map_or(0.0, |v| v as f32);
                out.set(Coord::new(x, y, z), value);
            }
        }
    }
    Ok(out)
}

/// Median filter (rank 0.5) with the default window count
pub fn median_filter(image: &FloatGrid, radius: usize) -> FilterResult<FloatGrid> {
    rank_filter(image, &RankFilterOptions::new().with_radius(radius))
}

/// Subtract the local median background from `image`
///
/// Each active voxel becomes `value - median`, clamped at 0.
pub fn subtract_background(image: &FloatGrid, radius: usize) -> FilterResult<FloatGrid> {
    let background = median_filter(image, radius)?;
    let mut out = image.clone();
    for c in image.coords() {
        out.set(c, (image.get(c) - background.get(c)).max(0.0));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(image: &FloatGrid, x: usize, y: usize, b: usize) -> f32 {
        let mut values = Vec::new();
        for wy in y.saturating_sub(b)..=(y + b).min(image.height() - 1) {
            for wx in x.saturating_sub(b)..=(x + b).min(image.width() - 1) {
                values.push(image.get(Coord::new_2d(wx, wy)) as u32);
            }
        }
        values.sort_unstable();
        values[values.len() / 2] as f32
    }

    #[test]
    fn test_median_interior() {
        let data: Vec<f32> = (1..=25).map(|v| ((v * 7) % 25 + 1) as f32).collect();
        let image = FloatGrid::from_data_2d(5, 5, data).unwrap();
        let filtered = median_filter(&image, 1).unwrap();
        for y in 1..4 {
            for x in 1..4 {
                assert_eq!(
                    filtered.get(Coord::new_2d(x, y)),
                    brute_force(&image, x, y, 1),
                    "at ({}, {})",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_present_count_at_edges() {
        let image = FloatGrid::from_data_2d(3, 1, vec![1.0, 5.0, 9.0]).unwrap();
        let opts = RankFilterOptions::new().with_box_count(BoxCount::Present);
        let filtered = rank_filter(&image, &opts).unwrap();
        assert_eq!(filtered.data(), &[5.0, 5.0, 9.0]);
    }

    #[test]
    fn test_nominal_count_leans_high_at_edges() {
        let image = FloatGrid::from_data_2d(3, 1, vec![1.0, 5.0, 9.0]).unwrap();
        let filtered = median_filter(&image, 1).unwrap();
        assert_eq!(filtered.data(), &[5.0, 9.0, 9.0]);
    }

    #[test]
    fn test_min_and_max_rank() {
        let image = FloatGrid::from_data_2d(4, 1, vec![4.0, 2.0, 8.0, 6.0]).unwrap();
        let min = rank_filter(
            &image,
            &RankFilterOptions::new()
                .with_rank(0.0)
                .with_box_count(BoxCount::Present),
        )
        .unwrap();
        assert_eq!(min.data(), &[2.0, 2.0, 2.0, 6.0]);
        let max = rank_filter(&image, &RankFilterOptions::new().with_rank(1.0)).unwrap();
        assert_eq!(max.data(), &[4.0, 8.0, 8.0, 8.0]);
    }

    #[test]
    fn test_negative_values_are_absent() {
        let image = FloatGrid::from_data_2d(3, 1, vec![-4.0, 3.0, -1.0]).unwrap();
        let opts = RankFilterOptions::new().with_box_count(BoxCount::Present);
        let filtered = rank_filter(&image, &opts).unwrap();
        assert_eq!(filtered.data(), &[3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_non_finite_and_huge_values() {
        let image =
            FloatGrid::from_data_2d(4, 1, vec![f32::INFINITY, 2.0, 1e12, f32::NAN]).unwrap();
        let opts = RankFilterOptions::new()
            .with_rank(1.0)
            .with_box_count(BoxCount::Present);
        let filtered = rank_filter(&image, &opts).unwrap();
        let top = cellseg_core::MAX_BUCKET as f32;
        assert_eq!(filtered.data(), &[2.0, top, top, top]);
    }

    #[test]
    fn test_invalid_rank() {
        let image = FloatGrid::new_2d(2, 2).unwrap();
        let opts = RankFilterOptions::new().with_rank(1.5);
        assert!(rank_filter(&image, &opts).is_err());
    }

    #[test]
    fn test_subtract_background() {
        let mut data = vec![10.0; 25];
        data[12] = 30.0;
        let image = FloatGrid::from_data_2d(5, 5, data).unwrap();
        let flat = subtract_background(&image, 1).unwrap();
        assert_eq!(flat.get(Coord::new_2d(2, 2)), 20.0);
        assert_eq!(flat.get(Coord::new_2d(0, 0)), 0.0);
    }
}
