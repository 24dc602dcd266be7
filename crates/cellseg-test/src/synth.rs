//! Synthetic test images
//!
//! Every generator is deterministic for a given seed so regression tests
//! are reproducible.

use crate::error::TestResult;
use cellseg_core::{Coord, FloatGrid};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Draw `n` samples from a normal distribution (Box-Muller)
pub fn gaussian_samples(mean: f64, sigma: f64, n: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        // 1 - u keeps the log argument in (0, 1]
        let u1: f64 = 1.0 - rng.random::<f64>();
        let u2: f64 = rng.random::<f64>();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        out.push((mean + sigma * r * theta.cos()) as f32);
        if out.len() < n {
            out.push((mean + sigma * r * theta.sin()) as f32);
        }
    }
    out
}

/// Grid whose pixels are two equally sized normal populations
///
/// Pixels of both populations are shuffled over the grid and clamped at 0.
pub fn bimodal_grid(
    width: usize,
    height: usize,
    low: (f64, f64),
    high: (f64, f64),
    seed: u64,
) -> TestResult<FloatGrid> {
    let n = width * height;
    let mut values = gaussian_samples(low.0, low.1, n / 2, seed);
    values.extend(gaussian_samples(high.0, high.1, n - n / 2, seed.wrapping_add(1)));
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(2));
    values.shuffle(&mut rng);
    for v in values.iter_mut() {
        *v = v.max(0.0);
    }
    Ok(FloatGrid::from_data_2d(width, height, values)?)
}

/// Binary mask with filled axis-aligned squares `(x, y, side)`
pub fn square_mask(
    width: usize,
    height: usize,
    squares: &[(usize, usize, usize)],
) -> TestResult<FloatGrid> {
    let mut grid = FloatGrid::new_2d(width, height)?;
    for &(x0, y0, side) in squares {
        for y in y0..(y0 + side).min(height) {
            for x in x0..(x0 + side).min(width) {
                grid.set(Coord::new_2d(x, y), 1.0);
            }
        }
    }
    Ok(grid)
}

/// Binary mask from an ASCII picture; `#` is foreground
///
/// Rows must all have the same length.
pub fn mask_from_ascii(rows: &[&str]) -> TestResult<FloatGrid> {
    let height = rows.len();
    let width = rows.first().map_or(0, |r| r.len());
    let data = rows
        .iter()
        .flat_map(|r| r.bytes().map(|b| if b == b'#' { 1.0 } else { 0.0 }))
        .collect();
    Ok(FloatGrid::from_data_2d(width, height, data)?)
}

/// Sum of isotropic Gaussian blobs `(cx, cy, sigma, amplitude)`
pub fn blob_image(
    width: usize,
    height: usize,
    blobs: &[(f64, f64, f64, f64)],
    background: f64,
) -> TestResult<FloatGrid> {
    let mut grid = FloatGrid::new_2d(width, height)?;
    for c in grid.coords() {
        let (x, y) = (c.x as f64, c.y as f64);
        let v: f64 = blobs
            .iter()
            .map(|&(cx, cy, s, a)| {
                let d2 = (x - cx).powi(2) + (y - cy).powi(2);
                a * (-d2 / (2.0 * s * s)).exp()
            })
            .sum();
        grid.set(c, (background + v) as f32);
    }
    Ok(grid)
}

/// Grid holding a random permutation of `1..=width*height*depth`
pub fn distinct_values_grid(
    width: usize,
    height: usize,
    depth: usize,
    seed: u64,
) -> TestResult<FloatGrid> {
    let n = width * height * depth;
    let mut values: Vec<f32> = (1..=n).map(|v| v as f32).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    values.shuffle(&mut rng);
    Ok(FloatGrid::from_data(width, height, depth, values)?)
}

/// Grid of uniform random integers in `0..=max_value`
pub fn random_grid(
    width: usize,
    height: usize,
    depth: usize,
    max_value: u32,
    seed: u64,
) -> TestResult<FloatGrid> {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = (0..width * height * depth)
        .map(|_| rng.random_range(0..=max_value) as f32)
        .collect();
    Ok(FloatGrid::from_data(width, height, depth, values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_samples_moments() {
        let s = gaussian_samples(50.0, 5.0, 20_000, 7);
        let mean = s.iter().map(|&v| v as f64).sum::<f64>() / s.len() as f64;
        let var = s.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / s.len() as f64;
        assert!((mean - 50.0).abs() < 0.2);
        assert!((var.sqrt() - 5.0).abs() < 0.2);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(gaussian_samples(0.0, 1.0, 10, 3), gaussian_samples(0.0, 1.0, 10, 3));
    }

    #[test]
    fn test_mask_from_ascii() {
        let m = mask_from_ascii(&["#..", ".##"]).unwrap();
        assert_eq!(m.dimensions(), [3, 2, 1]);
        assert_eq!(m.count_foreground(), 3);
    }

    #[test]
    fn test_distinct_values() {
        let g = distinct_values_grid(5, 5, 1, 1).unwrap();
        let mut v: Vec<u32> = g.data().iter().map(|&x| x as u32).collect();
        v.sort_unstable();
        assert_eq!(v, (1..=25).collect::<Vec<_>>());
    }
}
