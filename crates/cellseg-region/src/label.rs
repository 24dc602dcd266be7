//! Region statistics and label-map utilities
//!
//! This module provides per-region measurements over a [`LabelMap`] and
//! the size filtering and masking passes that run between labeling steps.

use crate::conncomp::relabel_in_place;
use crate::error::{RegionError, RegionResult};
use cellseg_core::{BoundingBox, FloatGrid, Grid, LabelMap};
use std::collections::HashMap;

/// Measurements of one labeled region
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStats {
    /// Region label
    pub label: u32,
    /// Number of voxels
    pub pixel_count: usize,
    /// Bounding box
    pub bounds: BoundingBox,
    /// Centroid `[x, y, z]`
    pub centroid: [f64; 3],
    /// Sum of intensities (0 when no intensity grid was given)
    pub intensity_sum: f64,
}

impl ComponentStats {
    /// Mean intensity over the region
    pub fn mean_intensity(&self) -> f64 {
        if self.pixel_count == 0 {
            0.0
        } else {
            self.intensity_sum / self.pixel_count as f64
        }
    }
}

/// Get detailed statistics for all regions
///
/// # Arguments
///
/// * `labels` - Label map
/// * `intensity` - Optional intensity grid of the same shape, summed per region
///
/// # Returns
///
/// One entry per distinct nonzero label, sorted by label.
pub fn component_stats(
    labels: &LabelMap,
    intensity: Option<&FloatGrid>,
) -> RegionResult<Vec<ComponentStats>> {
    if let Some(grid) = intensity {
        labels.check_same_shape(grid)?;
    }

    #[derive(Default)]
    struct Accum {
        count: usize,
        sum: [f64; 3],
        bounds: BoundingBox,
        intensity: f64,
    }

    let mut stats: HashMap<u32, Accum> = HashMap::new();
    for c in labels.coords() {
        let label = labels.get(c);
        if label == 0 {
            continue;
        }
        let acc = stats.entry(label).or_default();
        acc.count += 1;
        acc.sum[0] += c.x as f64;
        acc.sum[1] += c.y as f64;
        acc.sum[2] += c.z as f64;
        acc.bounds.expand_to_contain(c);
        if let Some(grid) = intensity {
            acc.intensity += grid.get(c) as f64;
        }
    }

    let mut result: Vec<ComponentStats> = stats
        .into_iter()
        .map(|(label, acc)| {
            let n = acc.count as f64;
            ComponentStats {
                label,
                pixel_count: acc.count,
                bounds: acc.bounds,
                centroid: [acc.sum[0] / n, acc.sum[1] / n, acc.sum[2] / n],
                intensity_sum: acc.intensity,
            }
        })
        .collect();

    result.sort_by_key(|s| s.label);
    Ok(result)
}

/// Voxel count per label
pub fn component_sizes(labels: &LabelMap) -> HashMap<u32, usize> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for c in labels.coords() {
        let label = labels.get(c);
        if label > 0 {
            *counts.entry(label).or_insert(0) += 1;
        }
    }
    counts
}

/// Remove regions whose size is outside `[min_size, max_size]`
///
/// Surviving regions are relabeled to `1..=N`.
///
/// # Errors
///
/// Returns `RegionError::InvalidParameters` if `min_size > max_size`.
pub fn filter_by_size(labels: &LabelMap, min_size: usize, max_size: usize) -> RegionResult<LabelMap> {
    if min_size > max_size {
        return Err(RegionError::InvalidParameters(format!(
            "min_size {} exceeds max_size {}",
            min_size, max_size
        )));
    }

    let sizes = component_sizes(labels);
    let mut out = labels.clone();
    for c in labels.coords() {
        let label = labels.get(c);
        if label == 0 {
            continue;
        }
        let n = sizes[&label];
        if n < min_size || n > max_size {
            out.set(c, 0);
        }
    }
    relabel_in_place(&mut out);
    Ok(out)
}

/// Zero every label where `mask` is not foreground
///
/// # Errors
///
/// Returns an error if the shapes differ.
pub fn apply_mask<T>(labels: &LabelMap, mask: &Grid<T>) -> RegionResult<LabelMap>
where
    T: Copy + Default + PartialOrd,
{
    labels.check_same_shape(mask)?;
    let mut out = labels.clone();
    for c in labels.coords() {
        if !mask.is_foreground(c) {
            out.set(c, 0);
        }
    }
    Ok(out)
}

/// Binary foreground (1.0 / 0.0) of a label map
pub fn mask_from_labels(labels: &LabelMap) -> FloatGrid {
    labels.map(|l| if l > 0 { 1.0 } else { 0.0 })
}
