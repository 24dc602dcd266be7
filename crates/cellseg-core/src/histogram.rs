//! Intensity histogram of a grid
//!
//! A [`Histogram`] is an immutable snapshot of the integer-bucketed
//! intensity distribution over a grid's active region. Values are bucketed
//! by truncation (`3.9` counts as `3`). Negative, NaN and infinite values
//! are skipped; finite values above [`MAX_BUCKET`] are counted in the top
//! bucket. Both are reported once per build through `log::warn!`.
//!
//! Statistics come in two flavours: over all counted values, and over the
//! nonzero values only. The nonzero statistics are what thresholding uses,
//! since background (zero) pixels would otherwise dominate.

use crate::grid::FloatGrid;
use log::warn;

/// Largest bucket index; larger values saturate into it
pub const MAX_BUCKET: u32 = (1 << 20) - 1;

/// Integer bucket of `v`, or `None` if `v` is negative, NaN or infinite
///
/// ```
/// use cellseg_core::histogram::{MAX_BUCKET, bucket};
///
/// assert_eq!(bucket(3.9), Some(3));
/// assert_eq!(bucket(1e12), Some(MAX_BUCKET));
/// assert_eq!(bucket(f32::INFINITY), None);
/// assert_eq!(bucket(-0.5), None);
/// ```
#[inline]
pub fn bucket(v: f32) -> Option<u32> {
    if !v.is_finite() || v < 0.0 {
        None
    } else if v >= MAX_BUCKET as f32 {
        Some(MAX_BUCKET)
    } else {
        Some(v as u32)
    }
}

/// Integer-bucketed intensity histogram with summary statistics
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    counts: Vec<u64>,
    cumulative: Vec<u64>,
    total: u64,
    skipped: u64,
    mean: f64,
    variance: f64,
    mean_nonzero: f64,
    variance_nonzero: f64,
    mode: u32,
    counts_at_mode: u64,
    min_value_nonzero: u32,
}

impl Histogram {
    /// Build the histogram of `grid`'s active region
    ///
    /// Never fails; an all-zero (or all-negative) grid yields a histogram
    /// with `max_value() == 0`.
    pub fn build(grid: &FloatGrid) -> Self {
        let mut counts = vec![0u64];
        let mut skipped = 0u64;
        let mut saturated = 0u64;

        for c in grid.coords() {
            let v = grid.get(c);
            let Some(b) = bucket(v) else {
                skipped += 1;
                continue;
            };
            if v >= (MAX_BUCKET + 1) as f32 {
                saturated += 1;
            }
            let b = b as usize;
            if b >= counts.len() {
                counts.resize(b + 1, 0);
            }
            counts[b] += 1;
        }

        let volume = grid.active_bounds().volume();
        if skipped > 0 {
            warn!(
                "histogram: skipped {} negative or non-finite values out of {}",
                skipped, volume
            );
        }
        if saturated > 0 {
            warn!(
                "histogram: {} values above {} counted in the top bucket",
                saturated, MAX_BUCKET
            );
        }

        Self::from_counts_with_skipped(counts, skipped)
    }

    /// Build a histogram directly from bucket counts
    ///
    /// Trailing empty buckets are kept, so `max_value()` is
    /// `counts.len() - 1`. An empty vector is treated as a single empty
    /// bucket.
    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self::from_counts_with_skipped(counts, 0)
    }

    fn from_counts_with_skipped(mut counts: Vec<u64>, skipped: u64) -> Self {
        if counts.is_empty() {
            counts.push(0);
        }

        let mut cumulative = Vec::with_capacity(counts.len());
        let mut running = 0u64;
        let mut sum = 0f64;
        for (v, &n) in counts.iter().enumerate() {
            running += n;
            cumulative.push(running);
            sum += v as f64 * n as f64;
        }
        let total = running;
        let total_nonzero = total - counts[0];

        let mean = if total > 0 { sum / total as f64 } else { 0.0 };
        let mean_nonzero = if total_nonzero > 0 {
            sum / total_nonzero as f64
        } else {
            0.0
        };

        // Second pass now that the means are known
        let mut ss = 0f64;
        let mut ss_nonzero = 0f64;
        let mut mode = 0u32;
        let mut counts_at_mode = 0u64;
        let mut min_value_nonzero = 0u32;
        for (v, &n) in counts.iter().enumerate() {
            if n == 0 {
                continue;
            }
            let fv = v as f64;
            ss += n as f64 * (fv - mean) * (fv - mean);
            if v == 0 {
                continue;
            }
            ss_nonzero += n as f64 * (fv - mean_nonzero) * (fv - mean_nonzero);
            if min_value_nonzero == 0 {
                min_value_nonzero = v as u32;
            }
            // Mode search excludes bucket 0; ties keep the lowest value
            if n > counts_at_mode {
                counts_at_mode = n;
                mode = v as u32;
            }
        }

        Histogram {
            counts,
            cumulative,
            total,
            skipped,
            mean,
            variance: if total > 0 { ss / total as f64 } else { 0.0 },
            mean_nonzero,
            variance_nonzero: if total_nonzero > 0 {
                ss_nonzero / total_nonzero as f64
            } else {
                0.0
            },
            mode,
            counts_at_mode,
            min_value_nonzero,
        }
    }

    /// Bucket counts, indexed by value
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Count for one value (0 past the maximum)
    #[inline]
    pub fn count(&self, value: u32) -> u64 {
        self.counts.get(value as usize).copied().unwrap_or(0)
    }

    /// `cumulative_counts()[v]` is the number of values `<= v`
    #[inline]
    pub fn cumulative_counts(&self) -> &[u64] {
        &self.cumulative
    }

    /// Largest bucket index
    #[inline]
    pub fn max_value(&self) -> u32 {
        (self.counts.len() - 1) as u32
    }

    /// Number of counted (non-negative) values
    #[inline]
    pub fn total_counts(&self) -> u64 {
        self.total
    }

    /// Number of counted values that are nonzero
    #[inline]
    pub fn total_nonzero(&self) -> u64 {
        self.total - self.counts[0]
    }

    /// Number of negative, NaN or infinite values that were skipped
    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Mean of all counted values
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance of all counted values
    #[inline]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Mean of the nonzero values
    #[inline]
    pub fn mean_nonzero(&self) -> f64 {
        self.mean_nonzero
    }

    /// Population variance of the nonzero values
    #[inline]
    pub fn variance_nonzero(&self) -> f64 {
        self.variance_nonzero
    }

    /// Most frequent nonzero value (0 if there is none)
    #[inline]
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Count at [`mode`](Self::mode)
    #[inline]
    pub fn counts_at_mode(&self) -> u64 {
        self.counts_at_mode
    }

    /// Smallest nonzero value present (0 if there is none)
    #[inline]
    pub fn min_value_nonzero(&self) -> u32 {
        self.min_value_nonzero
    }

    /// True if no nonzero value was counted
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.total_nonzero() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundingBox;

    #[test]
    fn test_basic_stats() {
        let g = FloatGrid::from_data_2d(3, 2, vec![0.0, 1.0, 2.0, 2.0, 3.7, 0.0]).unwrap();
        let h = Histogram::build(&g);
        assert_eq!(h.counts(), &[2, 1, 2, 1]);
        assert_eq!(h.cumulative_counts(), &[2, 3, 5, 6]);
        assert_eq!(h.total_counts(), 6);
        assert_eq!(h.max_value(), 3);
        assert_eq!(h.mode(), 2);
        assert_eq!(h.counts_at_mode(), 2);
        assert_eq!(h.min_value_nonzero(), 1);
        assert!((h.mean() - 8.0 / 6.0).abs() < 1e-12);
        assert!((h.mean_nonzero() - 2.0).abs() < 1e-12);
        assert!((h.variance_nonzero() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mode_excludes_zero() {
        let g = FloatGrid::from_data_2d(5, 1, vec![0.0, 0.0, 0.0, 4.0, 5.0]).unwrap();
        let h = Histogram::build(&g);
        assert_eq!(h.mode(), 4);
        assert_eq!(h.counts_at_mode(), 1);
    }

    #[test]
    fn test_negative_values_skipped() {
        let g = FloatGrid::from_data_2d(3, 1, vec![-2.0, 1.0, f32::NAN]).unwrap();
        let h = Histogram::build(&g);
        assert_eq!(h.total_counts(), 1);
        assert_eq!(h.skipped(), 2);
    }

    #[test]
    fn test_non_finite_and_huge_values() {
        let g = FloatGrid::from_data_2d(
            4,
            1,
            vec![1.0, f32::INFINITY, f32::NEG_INFINITY, 1e12],
        )
        .unwrap();
        let h = Histogram::build(&g);
        assert_eq!(h.skipped(), 2);
        assert_eq!(h.total_counts(), 2);
        assert_eq!(h.max_value(), MAX_BUCKET);
        assert_eq!(h.count(MAX_BUCKET), 1);
        assert_eq!(h.count(1), 1);
    }

    #[test]
    fn test_degenerate() {
        let g = FloatGrid::new_2d(4, 4).unwrap();
        let h = Histogram::build(&g);
        assert_eq!(h.max_value(), 0);
        assert_eq!(h.mode(), 0);
        assert_eq!(h.min_value_nonzero(), 0);
        assert!(h.is_degenerate());
    }

    #[test]
    fn test_respects_roi() {
        let mut g = FloatGrid::from_data_2d(4, 1, vec![9.0, 1.0, 1.0, 9.0]).unwrap();
        g.set_roi(Some(BoundingBox::new_2d(1, 0, 2, 1))).unwrap();
        let h = Histogram::build(&g);
        assert_eq!(h.max_value(), 1);
        assert_eq!(h.total_counts(), 2);
    }
}
