//! Histogram regression test
//!
//! Compares histogram statistics against direct computation over the
//! grid data, with and without a region of interest.

use cellseg_core::{BoundingBox, Coord, FloatGrid, Histogram, MAX_BUCKET};
use cellseg_test::RegParams;
use cellseg_test::synth::{bimodal_grid, random_grid};

fn direct_mean(values: &[u32]) -> f64 {
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

fn direct_variance(values: &[u32]) -> f64 {
    let mean = direct_mean(values);
    values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64
}

#[test]
fn histogram_reg() {
    let mut rp = RegParams::new("histogram");

    // --- Test 1: Statistics of a random grid ---
    eprintln!("=== Random grid ===");
    let grid = random_grid(40, 25, 1, 9, 3).unwrap();
    let hist = Histogram::build(&grid);
    let values: Vec<u32> = grid.data().iter().map(|&v| v as u32).collect();
    let nonzero: Vec<u32> = values.iter().copied().filter(|&v| v > 0).collect();

    rp.compare_values(1000.0, hist.total_counts() as f64, 0.0);
    rp.compare_values(nonzero.len() as f64, hist.total_nonzero() as f64, 0.0);
    rp.compare_values(
        hist.total_counts() as f64,
        hist.cumulative_counts()[hist.max_value() as usize] as f64,
        0.0,
    );
    rp.compare_values(direct_mean(&values), hist.mean(), 1e-9);
    rp.compare_values(direct_variance(&values), hist.variance(), 1e-9);
    rp.compare_values(direct_mean(&nonzero), hist.mean_nonzero(), 1e-9);
    rp.compare_values(direct_variance(&nonzero), hist.variance_nonzero(), 1e-9);

    let best = (1..=hist.max_value()).map(|v| hist.count(v)).max().unwrap_or(0);
    rp.compare_values(best as f64, hist.counts_at_mode() as f64, 0.0);
    rp.compare_values(best as f64, hist.count(hist.mode()) as f64, 0.0);
    rp.check(hist.mode() > 0);

    // --- Test 2: Region of interest restricts the counts ---
    eprintln!("=== Region of interest ===");
    let mut roi_grid = grid.clone();
    roi_grid
        .set_roi(Some(BoundingBox::new(5, 5, 0, 10, 10, 1).unwrap()))
        .unwrap();
    let hist = Histogram::build(&roi_grid);
    rp.compare_values(100.0, hist.total_counts() as f64, 0.0);
    let inside: Vec<u32> = roi_grid.coords().map(|c| grid.get(c) as u32).collect();
    rp.compare_values(direct_mean(&inside), hist.mean(), 1e-9);

    // --- Test 3: Negative and non-finite values are skipped ---
    eprintln!("=== Negative and non-finite values ===");
    let mut signed = FloatGrid::new_2d(4, 4).unwrap();
    signed.set(Coord::new_2d(0, 0), -3.0);
    signed.set(Coord::new_2d(1, 0), f32::NAN);
    signed.set(Coord::new_2d(2, 0), 7.5);
    let hist = Histogram::build(&signed);
    rp.compare_values(2.0, hist.skipped() as f64, 0.0);
    rp.compare_values(14.0, hist.total_counts() as f64, 0.0);
    rp.compare_values(7.0, hist.min_value_nonzero() as f64, 0.0);
    rp.compare_values(7.0, hist.mean_nonzero(), 0.0);

    signed.set(Coord::new_2d(3, 0), f32::INFINITY);
    signed.set(Coord::new_2d(0, 1), 1e12);
    let hist = Histogram::build(&signed);
    rp.compare_values(3.0, hist.skipped() as f64, 0.0);
    rp.compare_values(MAX_BUCKET as f64, hist.max_value() as f64, 0.0);
    rp.compare_values(1.0, hist.count(MAX_BUCKET) as f64, 0.0);
    rp.compare_values(13.0, hist.total_counts() as f64, 0.0);

    // --- Test 4: Bimodal populations ---
    eprintln!("=== Bimodal grid ===");
    let grid = bimodal_grid(100, 100, (50.0, 8.0), (200.0, 8.0), 11).unwrap();
    let hist = Histogram::build(&grid);
    rp.compare_values(125.0, hist.mean_nonzero(), 2.0);
    // Between-class 75^2 plus within-class 8^2
    rp.compare_values(5689.0, hist.variance_nonzero(), 300.0);
    rp.check(hist.count(125) < hist.count(50));

    assert!(rp.cleanup(), "histogram regression test failed");
}
