//! Maximum-separability thresholding
//!
//! Chooses an intensity cutoff `k` from a [`Histogram`] by maximizing the
//! between-class separability over the nonzero pixels:
//!
//! ```text
//! omega(k) = (pixels with 0 < v <= k) / nonzero pixels
//! mu(k)    = (sum of v over 0 < v <= k) / nonzero pixels
//! eta(k)   = omega (1 - omega) ((mean_nonzero - mu) / (1 - omega) - mu / omega)^2
//! ```
//!
//! Three variants build on the curve:
//!
//! - [`compute_separability_threshold`] takes the global maximum, lowest
//!   `k` on ties;
//! - [`compute_local_max_threshold`] fits a double Gaussian to the curve
//!   around its two strongest local maxima and takes the upper component;
//! - [`threshold_recursive`] re-thresholds oversized regions of a mask
//!   against a reference grid, one region at a time.
//!
//! Thresholding zeroes every pixel whose value is below the cutoff and
//! leaves the others unchanged.

use crate::error::{FilterError, FilterResult};
use crate::simplex::{DoubleGaussian, SimplexOptions};
use cellseg_core::{Coord, FloatGrid, Histogram, LabelMap};
use cellseg_region::{component_stats, filter_by_size, label, mask_from_labels};
use log::{debug, warn};

/// Below this, `omega` or `1 - omega` counts as zero
const OMEGA_EPSILON: f64 = 1e-12;

/// Upper bound on candidate cutoffs when the increment is adaptive
const ADAPTIVE_CANDIDATES: u32 = 1000;

/// Options for separability thresholding
#[derive(Debug, Clone)]
pub struct ThresholdOptions {
    /// Pick the candidate step from the dynamic range (about 1000 candidates)
    pub adaptive_increment: bool,
    /// Candidate step when `adaptive_increment` is off
    pub threshold_increment: u32,
}

impl Default for ThresholdOptions {
    fn default() -> Self {
        Self {
            adaptive_increment: false,
            threshold_increment: 1,
        }
    }
}

impl ThresholdOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set adaptive candidate spacing
    pub fn with_adaptive_increment(mut self, adaptive: bool) -> Self {
        self.adaptive_increment = adaptive;
        self
    }

    /// Set the fixed candidate step
    pub fn with_threshold_increment(mut self, increment: u32) -> Self {
        self.threshold_increment = increment;
        self
    }

    /// Check the options
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidParameters` if the fixed increment is 0.
    pub fn validate(&self) -> FilterResult<()> {
        if !self.adaptive_increment && self.threshold_increment == 0 {
            return Err(FilterError::InvalidParameters(
                "threshold_increment must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate step for `hist`
    pub fn increment_for(&self, hist: &Histogram) -> u32 {
        if self.adaptive_increment {
            let range = hist.max_value().saturating_sub(hist.min_value_nonzero());
            range.div_ceil(ADAPTIVE_CANDIDATES).max(1)
        } else {
            self.threshold_increment.max(1)
        }
    }
}

/// Separability `eta(k)` at each evaluated candidate cutoff `k`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeparabilityCurve {
    ks: Vec<u32>,
    eta: Vec<f64>,
}

impl SeparabilityCurve {
    /// Evaluated cutoffs, increasing
    pub fn ks(&self) -> &[u32] {
        &self.ks
    }

    /// Separability at each cutoff
    pub fn eta(&self) -> &[f64] {
        &self.eta
    }

    pub fn len(&self) -> usize {
        self.ks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ks.is_empty()
    }

    /// Index of the global maximum (first one on ties)
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, &e) in self.eta.iter().enumerate() {
            match best {
                Some(b) if self.eta[b] >= e => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// Indices of the strict local maxima
    ///
    /// Runs of equal values are treated as one point, reported at the
    /// run's first index. A run is a local maximum when runs exist on both
    /// sides and both are lower.
    pub fn local_maxima(&self) -> Vec<usize> {
        let mut runs: Vec<(usize, f64)> = Vec::new();
        for (i, &e) in self.eta.iter().enumerate() {
            if runs.last().is_none_or(|&(_, prev)| prev != e) {
                runs.push((i, e));
            }
        }
        runs.windows(3)
            .filter(|w| w[1].1 > w[0].1 && w[1].1 > w[2].1)
            .map(|w| w[1].0)
            .collect()
    }

    /// Index of the evaluated cutoff nearest to `k`
    ///
    /// `None` if `k` is not finite or lies outside the evaluated range.
    pub fn nearest_index(&self, k: f64) -> Option<usize> {
        let (first, last) = (*self.ks.first()?, *self.ks.last()?);
        if !k.is_finite() || k < first as f64 || k > last as f64 {
            return None;
        }
        self.ks
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (**a as f64 - k).abs().total_cmp(&(**b as f64 - k).abs())
            })
            .map(|(i, _)| i)
    }
}

/// Evaluate `eta(k)` for every candidate cutoff of `hist`
///
/// Candidates run from the smallest nonzero value to the largest value,
/// spaced by [`ThresholdOptions::increment_for`]. A histogram without
/// nonzero values gives an empty curve.
pub fn separability_curve(hist: &Histogram, options: &ThresholdOptions) -> SeparabilityCurve {
    if hist.is_degenerate() {
        return SeparabilityCurve::default();
    }
    let counts = hist.counts();
    let n = hist.total_nonzero() as f64;
    let mean = hist.mean_nonzero();
    let step = options.increment_for(hist) as usize;
    let (lo, hi) = (hist.min_value_nonzero() as usize, hist.max_value() as usize);

    let mut curve = SeparabilityCurve::default();
    let (mut below, mut weighted) = (0u64, 0f64);
    let mut v = 1usize;
    let mut k = lo;
    while k <= hi {
        while v <= k {
            below += counts[v];
            weighted += v as f64 * counts[v] as f64;
            v += 1;
        }
        let omega = below as f64 / n;
        let mu = weighted / n;
        let eta = if omega < OMEGA_EPSILON || 1.0 - omega < OMEGA_EPSILON {
            0.0
        } else {
            let diff = (mean - mu) / (1.0 - omega) - mu / omega;
            omega * (1.0 - omega) * diff * diff
        };
        curve.ks.push(k as u32);
        curve.eta.push(eta);
        k += step;
    }
    curve
}

/// Cutoff at the curve's global maximum, or 0 if nothing is separable
fn best_cutoff(curve: &SeparabilityCurve) -> u32 {
    curve
        .argmax()
        .filter(|&i| curve.eta[i] > 0.0)
        .map_or(0, |i| curve.ks[i])
}

/// Global maximum-separability cutoff of `hist`
///
/// Returns 0 when no cutoff separates anything: no nonzero values, or a
/// single nonzero value.
pub fn compute_separability_threshold(hist: &Histogram, options: &ThresholdOptions) -> u32 {
    best_cutoff(&separability_curve(hist, options))
}

/// Outcome of local-maximum thresholding
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMaxThreshold {
    /// Selected cutoff
    pub threshold: u32,
    /// Mean of the nonzero values below the cutoff
    pub lower_mean: f64,
    /// Mean of the values at or above the cutoff
    pub upper_mean: f64,
    /// The fitted model, or `None` when the global maximum was used
    pub model: Option<DoubleGaussian>,
}

/// Mean of the nonzero values below `k` and of the values at or above it
///
/// An empty class has mean 0.
pub fn class_means(hist: &Histogram, k: u32) -> (f64, f64) {
    let mut sums = [0f64; 2];
    let mut counts = [0u64; 2];
    for (v, &n) in hist.counts().iter().enumerate().skip(1) {
        let class = usize::from(v as u64 >= k as u64);
        sums[class] += v as f64 * n as f64;
        counts[class] += n;
    }
    let mean = |i: usize| {
        if counts[i] == 0 {
            0.0
        } else {
            sums[i] / counts[i] as f64
        }
    };
    (mean(0), mean(1))
}

/// Indices of the two curve points that seed the double-Gaussian fit
fn fit_seeds(curve: &SeparabilityCurve) -> Option<(usize, usize)> {
    let mut maxima = curve.local_maxima();
    match maxima.len() {
        0 => None,
        1 => {
            let i = maxima[0];
            let last = curve.len() - 1;
            let far = if i > last - i { 0 } else { last };
            let mid = (i + far) / 2;
            Some((i.min(mid), i.max(mid)))
        }
        _ => {
            // Strongest two, then back in cutoff order
            maxima.sort_by(|&a, &b| curve.eta[b].total_cmp(&curve.eta[a]));
            let (a, b) = (maxima[0], maxima[1]);
            Some((a.min(b), a.max(b)))
        }
    }
}

/// Evaluated cutoff nearest to the upper mean of `model`, if it is in range
fn fitted_cutoff(curve: &SeparabilityCurve, model: &DoubleGaussian) -> Option<u32> {
    curve
        .nearest_index(model.upper_mean())
        .map(|i| curve.ks[i])
}

/// Local-maximum separability cutoff of `hist`
///
/// Fits a two-component Gaussian model to the `eta(k)` curve with a
/// Nelder-Mead search seeded from the two strongest local maxima (or one
/// maximum and the midpoint towards the far end of the curve), spread set
/// to a quarter of their separation. The evaluated cutoff nearest to the
/// upper component mean is the threshold. When the curve has no local
/// maximum, or the fit lands outside the evaluated range, the global
/// maximum is used instead.
pub fn compute_local_max_threshold(
    hist: &Histogram,
    options: &ThresholdOptions,
) -> LocalMaxThreshold {
    let curve = separability_curve(hist, options);
    let fallback = best_cutoff(&curve);

    let fitted = fit_seeds(&curve).and_then(|(i, j)| {
        let (k1, k2) = (curve.ks[i] as f64, curve.ks[j] as f64);
        let sigma = ((k2 - k1).abs() / 4.0).max(1.0);
        let initial = DoubleGaussian {
            a1: curve.eta[i],
            mu1: k1,
            sigma1: sigma,
            a2: curve.eta[j],
            mu2: k2,
            sigma2: sigma,
        };
        let xs: Vec<f64> = curve.ks.iter().map(|&k| k as f64).collect();
        let (model, min) =
            DoubleGaussian::fit(&xs, &curve.eta, initial, &SimplexOptions::default());
        debug!(
            "local max threshold: fit means {:.2} / {:.2} after {} iterations (residual {:.3e})",
            model.mu1, model.mu2, min.iterations, min.value
        );
        match fitted_cutoff(&curve, &model) {
            Some(k) => Some((k, model)),
            None => {
                warn!(
                    "local max threshold: fitted mean {} outside [{}, {}], using global maximum {}",
                    model.upper_mean(),
                    curve.ks[0],
                    curve.ks[curve.len() - 1],
                    fallback
                );
                None
            }
        }
    });

    let (threshold, model) = match fitted {
        Some((k, model)) => (k, Some(model)),
        None => (fallback, None),
    };
    let (lower_mean, upper_mean) = class_means(hist, threshold);
    debug!(
        "local max threshold: {} (class means {:.2} / {:.2})",
        threshold, lower_mean, upper_mean
    );
    LocalMaxThreshold {
        threshold,
        lower_mean,
        upper_mean,
        model,
    }
}

/// Copy of `image` with every active value below `threshold` set to 0
///
/// Values equal to the cutoff are kept. Since `eta(k)` puts values `<= k`
/// in the lower class and ties go to the lowest `k`, an image made of a
/// few flat levels is cut at one of those levels and keeps it: on a
/// 50/150 image the cutoff is 50 and nothing is zeroed.
pub fn apply_threshold(image: &FloatGrid, threshold: u32) -> FloatGrid {
    let cutoff = threshold as f32;
    let mut out = image.clone();
    for c in image.coords() {
        if image.get(c) < cutoff {
            out.set(c, 0.0);
        }
    }
    out
}

/// A thresholded image and the cutoff that produced it
#[derive(Debug, Clone)]
pub struct Thresholded {
    pub image: FloatGrid,
    pub threshold: u32,
}

/// Threshold `image` at its global maximum-separability cutoff
///
/// # Errors
///
/// Returns `FilterError::InvalidParameters` for invalid options.
pub fn threshold_separability(
    image: &FloatGrid,
    options: &ThresholdOptions,
) -> FilterResult<Thresholded> {
    options.validate()?;
    let hist = Histogram::build(image);
    let threshold = compute_separability_threshold(&hist, options);
    debug!("separability threshold: {}", threshold);
    Ok(Thresholded {
        image: apply_threshold(image, threshold),
        threshold,
    })
}

/// Threshold `image` at its local-maximum separability cutoff
///
/// # Errors
///
/// Returns `FilterError::InvalidParameters` for invalid options.
pub fn threshold_local_max(
    image: &FloatGrid,
    options: &ThresholdOptions,
) -> FilterResult<(Thresholded, LocalMaxThreshold)> {
    options.validate()?;
    let hist = Histogram::build(image);
    let result = compute_local_max_threshold(&hist, options);
    Ok((
        Thresholded {
            image: apply_threshold(image, result.threshold),
            threshold: result.threshold,
        },
        result,
    ))
}

/// Options for recursive thresholding
#[derive(Debug, Clone)]
pub struct RecursiveThresholdOptions {
    /// Regions smaller than this are removed
    pub area_min: usize,
    /// Regions larger than this are re-thresholded
    pub area_max: usize,
    /// Re-thresholding rounds before giving up
    pub max_recursions: usize,
    /// Options for each per-region threshold
    pub threshold: ThresholdOptions,
}

impl Default for RecursiveThresholdOptions {
    fn default() -> Self {
        Self {
            area_min: 25,
            area_max: 1000,
            max_recursions: 3,
            threshold: ThresholdOptions::default(),
        }
    }
}

impl RecursiveThresholdOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the removal size
    pub fn with_area_min(mut self, area_min: usize) -> Self {
        self.area_min = area_min;
        self
    }

    /// Set the re-threshold size
    pub fn with_area_max(mut self, area_max: usize) -> Self {
        self.area_max = area_max;
        self
    }

    /// Set the recursion budget
    pub fn with_max_recursions(mut self, max_recursions: usize) -> Self {
        self.max_recursions = max_recursions;
        self
    }

    /// Set the per-region threshold options
    pub fn with_threshold(mut self, threshold: ThresholdOptions) -> Self {
        self.threshold = threshold;
        self
    }

    /// Check the options
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidParameters` if `area_min > area_max` or
    /// the threshold options are invalid.
    pub fn validate(&self) -> FilterResult<()> {
        if self.area_min > self.area_max {
            return Err(FilterError::InvalidParameters(format!(
                "area_min {} exceeds area_max {}",
                self.area_min, self.area_max
            )));
        }
        self.threshold.validate()
    }
}

/// Split oversized regions of `mask` by thresholding `reference` per region
///
/// Each round labels the mask, drops regions under `area_min`, and for
/// every region over `area_max` computes the separability cutoff of the
/// reference intensities inside that region alone (restricted to its
/// bounding box) and keeps only the region pixels at or above it. Rounds
/// repeat until nothing is oversized or `max_recursions` rounds have run.
///
/// Returns the final label map with consecutive labels.
///
/// # Errors
///
/// Returns an error if the grids differ in shape or the options are invalid.
pub fn threshold_recursive(
    mask: &FloatGrid,
    reference: &FloatGrid,
    options: &RecursiveThresholdOptions,
) -> FilterResult<LabelMap> {
    options.validate()?;
    mask.check_same_shape(reference)?;

    let mut current = mask.clone();
    let mut level = 0;
    loop {
        let labels = filter_by_size(&label(&current), options.area_min, usize::MAX)?;
        let stats = component_stats(&labels, None)?;
        let oversized: Vec<_> = stats
            .iter()
            .filter(|s| s.pixel_count > options.area_max)
            .collect();
        debug!(
            "recursive threshold: level {}: {} regions, {} oversized",
            level,
            stats.len(),
            oversized.len()
        );

        if oversized.is_empty() {
            return Ok(labels);
        }
        if level == options.max_recursions {
            warn!(
                "recursive threshold: budget of {} rounds exhausted with {} oversized regions",
                options.max_recursions,
                oversized.len()
            );
            return Ok(labels);
        }

        current = mask_from_labels(&labels);
        for region in oversized {
            let mut local = reference.crop(&region.bounds)?;
            for c in local.coords() {
                let global = Coord::new(
                    c.x + region.bounds.x,
                    c.y + region.bounds.y,
                    c.z + region.bounds.z,
                );
                if labels.get(global) != region.label {
                    local.set(c, 0.0);
                }
            }
            let hist = Histogram::build(&local);
            let k = compute_separability_threshold(&hist, &options.threshold) as f32;
            debug!(
                "recursive threshold: region {} ({} px) cut at {}",
                region.label, region.pixel_count, k
            );
            for c in local.coords() {
                let global = Coord::new(
                    c.x + region.bounds.x,
                    c.y + region.bounds.y,
                    c.z + region.bounds.z,
                );
                if labels.get(global) == region.label && reference.get(global) < k {
                    current.set(global, 0.0);
                }
            }
        }
        level += 1;
    }
}
