//! One segmentation step: intensity grid in, label map out

use crate::segment_error::{SegmentError, SegmentResult};
use crate::params::{SegmentationMethod, SegmentationParams};
use cellseg_core::{FloatGrid, LabelMap};
use cellseg_filter::{
    subtract_background, threshold_local_max, threshold_recursive, threshold_separability,
};
use cellseg_region::{WatershedStrategy, count_regions, filter_by_size, label, watershed};
use log::{debug, info};

/// Result of [`segment`]
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Region labels, consecutive from 1
    pub labels: LabelMap,
    /// Global intensity cutoff that produced the foreground
    pub threshold: u32,
    /// Number of regions in `labels`
    pub region_count: usize,
}

/// Segment `image` according to `params`
///
/// Runs, in order: optional median background subtraction
/// (`box_radius > 0`), thresholding, labeling or watershed depending on
/// the method, and finally removal of regions outside
/// `[min_size, max_size]`. The recursive method re-thresholds oversized
/// regions instead of dropping them.
///
/// # Errors
///
/// Returns `SegmentError::MissingReference` if the method needs `seeds`
/// and none were given, `SegmentError::Params` for invalid parameters,
/// and propagates shape mismatches from the filters.
pub fn segment(
    image: &FloatGrid,
    seeds: Option<&LabelMap>,
    params: &SegmentationParams,
) -> SegmentResult<Segmentation> {
    params.validate()?;
    let strategy = match (params.method, seeds) {
        (SegmentationMethod::SeededWatershed, Some(seeds)) => WatershedStrategy::Seeded(seeds),
        (SegmentationMethod::SeededWatershed, None) => {
            return Err(SegmentError::MissingReference {
                what: "seed label map",
                method: params.method,
            });
        }
        _ => WatershedStrategy::Unseeded,
    };

    let working = if params.box_radius > 0 {
        subtract_background(image, params.box_radius)?
    } else {
        image.clone()
    };

    let threshold_opts = params.threshold_options();
    let (labels, threshold) = match params.method {
        SegmentationMethod::Threshold => {
            let t = threshold_separability(&working, &threshold_opts)?;
            (label(&t.image), t.threshold)
        }
        SegmentationMethod::LocalMaxThreshold => {
            let (t, stats) = threshold_local_max(&working, &threshold_opts)?;
            debug!(
                "segment: class means {:.2} / {:.2}",
                stats.lower_mean, stats.upper_mean
            );
            (label(&t.image), t.threshold)
        }
        SegmentationMethod::RecursiveThreshold => {
            let t = threshold_separability(&working, &threshold_opts)?;
            let labels = threshold_recursive(&t.image, &working, &params.recursive_options())?;
            (labels, t.threshold)
        }
        SegmentationMethod::Watershed | SegmentationMethod::SeededWatershed => {
            let t = threshold_separability(&working, &threshold_opts)?;
            let labels = watershed(&t.image, strategy, &params.watershed_options())?;
            (labels, t.threshold)
        }
    };

    let labels = match params.method {
        SegmentationMethod::RecursiveThreshold => labels,
        _ => filter_by_size(&labels, params.min_size, params.max_size)?,
    };
    let region_count = count_regions(&labels);
    info!(
        "segment: {:?} at threshold {}: {} regions",
        params.method, threshold, region_count
    );

    Ok(Segmentation {
        labels,
        threshold,
        region_count,
    })
}
