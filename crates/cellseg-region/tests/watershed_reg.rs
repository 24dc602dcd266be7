//! Watershed segmentation regression test
//!
//! Unseeded flooding of peaked images and seeded flooding that absorbs
//! over-segmented basins into the seed regions.

use cellseg_core::{Coord, FloatGrid, LabelMap};
use cellseg_region::{
    WatershedOptions, WatershedStrategy, count_regions, watershed, watershed_seeded,
    watershed_unseeded,
};
use cellseg_test::RegParams;
use cellseg_test::synth::blob_image;

/// Two square cones centered at (5, 3) and (15, 3); the column x = 10 is equidistant
fn two_cones() -> FloatGrid {
    let mut image = FloatGrid::new_2d(21, 7).unwrap();
    for c in image.coords() {
        let d = |cx: usize, cy: usize| c.x.abs_diff(cx).max(c.y.abs_diff(cy));
        let nearest = d(5, 3).min(d(15, 3));
        image.set(c, 8.0 - nearest as f32);
    }
    image
}

/// Columns `[1, 3, 2, 3, 5, 3, 2, 3, 1]`: two outer valleys, two inner dips, one ridge
fn ridged_rows() -> FloatGrid {
    let profile = [1.0, 3.0, 2.0, 3.0, 5.0, 3.0, 2.0, 3.0, 1.0];
    let mut image = FloatGrid::new_2d(profile.len(), 3).unwrap();
    for c in image.coords() {
        image.set(c, profile[c.x]);
    }
    image
}

#[test]
fn watershed_reg() {
    let mut rp = RegParams::new("watershed");

    // --- Test 1: Two cones split by a one-pixel barrier ---
    eprintln!("=== Unseeded cones ===");
    let cones = two_cones();
    let labels = watershed_unseeded(&cones).unwrap();
    rp.compare_values(2.0, count_regions(&labels) as f64, 0.0);
    for c in labels.coords() {
        let expected = match c.x {
            x if x < 10 => 1,
            10 => 0,
            _ => 2,
        };
        if !rp.compare_values(expected as f64, labels.get(c) as f64, 0.0) {
            eprintln!("  mismatch at {}", c);
        }
    }

    // --- Test 2: Every pixel is decided on a smooth two-blob image ---
    eprintln!("=== Unseeded blobs ===");
    let blobs = blob_image(40, 20, &[(10.0, 10.0, 3.0, 100.0), (30.0, 10.0, 3.0, 100.0)], 1.0)
        .unwrap();
    let labels = watershed_unseeded(&blobs).unwrap();
    let n = count_regions(&labels) as u32;
    eprintln!("  regions: {}", n);
    rp.check(n >= 2);
    rp.compare_values(n as f64, labels.max_label() as f64, 0.0);
    rp.check(labels.data().iter().all(|&l| l <= n));
    let (a, b) = (
        labels.get(Coord::new_2d(10, 10)),
        labels.get(Coord::new_2d(30, 10)),
    );
    rp.check(a > 0 && b > 0 && a != b);

    // --- Test 3: Seeded flooding merges inner dips into the seeds ---
    eprintln!("=== Seeded ridge ===");
    let ridge = ridged_rows();
    let mut seeds = LabelMap::new_like(&ridge);
    for y in 0..3 {
        seeds.set(Coord::new_2d(0, y), 1);
        seeds.set(Coord::new_2d(8, y), 2);
    }
    let labels = watershed_seeded(&ridge, &seeds).unwrap();
    rp.compare_values(2.0, count_regions(&labels) as f64, 0.0);
    for c in labels.coords() {
        let expected = match c.x {
            x if x < 4 => 1,
            4 => 0,
            _ => 2,
        };
        rp.compare_values(expected as f64, labels.get(c) as f64, 0.0);
    }

    // The same image unseeded keeps the outer valleys apart from the ridge basin
    let unseeded = watershed_unseeded(&ridge).unwrap();
    rp.compare_values(3.0, count_regions(&unseeded) as f64, 0.0);
    rp.compare_values(0.0, unseeded.get(Coord::new_2d(2, 1)) as f64, 0.0);
    rp.compare_values(0.0, unseeded.get(Coord::new_2d(6, 1)) as f64, 0.0);

    // --- Test 4: Background masking ---
    let mut sparse = ridge.clone();
    for y in 0..3 {
        sparse.set(Coord::new_2d(4, y), 0.0);
    }
    let masked = watershed(
        &sparse,
        WatershedStrategy::Seeded(&seeds),
        &WatershedOptions::default(),
    )
    .unwrap();
    rp.compare_values(0.0, masked.get(Coord::new_2d(4, 1)) as f64, 0.0);
    rp.compare_values(2.0, count_regions(&masked) as f64, 0.0);

    let flooded = watershed(
        &sparse,
        WatershedStrategy::Seeded(&seeds),
        &WatershedOptions::new().with_mask_background(false),
    )
    .unwrap();
    // The zero column floods first and lies between both seeds
    rp.check(flooded.get(Coord::new_2d(4, 1)) > 0);

    assert!(rp.cleanup(), "watershed regression test failed");
}
