//! Connected component labeling regression test
//!
//! Labeling, relabeling and merging on synthetic masks in 2D and 3D.

use cellseg_core::{Coord, LabelMap};
use cellseg_region::{
    Connectivity, component_stats, count_regions, filter_by_size, label, label_with,
    mask_from_labels, merge, relabel,
};
use cellseg_test::RegParams;
use cellseg_test::synth::{mask_from_ascii, random_grid, square_mask};

/// Hand-label two 3x3 squares as regions 1 and 2
fn two_square_labels(second: (usize, usize)) -> LabelMap {
    let mut labels = LabelMap::new_2d(10, 10).unwrap();
    for y in 0..3 {
        for x in 0..3 {
            labels.set(Coord::new_2d(x, y), 1);
            labels.set(Coord::new_2d(second.0 + x, second.1 + y), 2);
        }
    }
    labels
}

#[test]
fn label_reg() {
    let mut rp = RegParams::new("label");

    // --- Test 1: ASCII mask with known components ---
    eprintln!("=== ASCII mask ===");
    let mask = mask_from_ascii(&[
        "##....#.",
        "##...##.",
        "........",
        ".#......",
        "..#...##",
        "......##",
    ])
    .unwrap();
    let labels = label(&mask);
    eprintln!("  regions: {}", count_regions(&labels));
    rp.compare_values(4.0, count_regions(&labels) as f64, 0.0);
    rp.compare_values(4.0, labels.max_label() as f64, 0.0);
    // First component in raster order gets label 1
    rp.compare_values(1.0, labels.get(Coord::new_2d(0, 0)) as f64, 0.0);
    rp.compare_values(2.0, labels.get(Coord::new_2d(6, 0)) as f64, 0.0);
    // Diagonal pair joined by 8-connectivity
    rp.check(labels.get(Coord::new_2d(1, 3)) == labels.get(Coord::new_2d(2, 4)));

    // --- Test 2: Edge-only neighbors split the diagonal pair ---
    let by_edges = label_with(&mask, Connectivity::SixWay);
    rp.compare_values(5.0, count_regions(&by_edges) as f64, 0.0);

    // --- Test 3: Idempotence and consecutive labels on random masks ---
    eprintln!("=== Random masks ===");
    for seed in 0..4 {
        let noise = random_grid(32, 24, 1, 1, seed).unwrap();
        let labels = label(&noise);
        let n = count_regions(&labels);
        rp.compare_values(n as f64, labels.max_label() as f64, 0.0);
        rp.compare_grids(&labels, &relabel(&labels));
        rp.compare_grids(&labels, &label(&mask_from_labels(&labels)));
        let stats = component_stats(&labels, None).unwrap();
        let covered: usize = stats.iter().map(|s| s.pixel_count).sum();
        rp.compare_values(noise.count_foreground() as f64, covered as f64, 0.0);
    }

    // --- Test 4: 3D labeling is 6-connected ---
    eprintln!("=== 3D ===");
    let volume = random_grid(12, 10, 4, 1, 42).unwrap();
    let labels = label(&volume);
    rp.compare_grids(&labels, &label_with(&volume, Connectivity::SixWay));
    rp.compare_values(
        count_regions(&labels) as f64,
        labels.max_label() as f64,
        0.0,
    );

    // --- Test 5: Merge of corner-touching vs separated squares ---
    eprintln!("=== Merge ===");
    let touching = two_square_labels((3, 3));
    let merged = merge(&touching);
    rp.compare_values(1.0, count_regions(&merged) as f64, 0.0);
    rp.compare_values(1.0, merged.get(Coord::new_2d(5, 5)) as f64, 0.0);

    let separated = two_square_labels((5, 5));
    let merged = merge(&separated);
    rp.compare_values(2.0, count_regions(&merged) as f64, 0.0);
    rp.compare_grids(&separated, &merged);

    // Labeling the same geometry from a binary mask agrees with merging
    let touching_mask = square_mask(10, 10, &[(0, 0, 3), (3, 3, 3)]).unwrap();
    rp.compare_values(1.0, count_regions(&label(&touching_mask)) as f64, 0.0);
    let separated_mask = square_mask(10, 10, &[(0, 0, 3), (5, 5, 3)]).unwrap();
    rp.compare_partitions(&separated, &label(&separated_mask));

    // --- Test 6: Size filtering ---
    let sizes = square_mask(20, 20, &[(0, 0, 2), (5, 5, 4), (12, 12, 6)]).unwrap();
    let labels = label(&sizes);
    let kept = filter_by_size(&labels, 10, 20).unwrap();
    rp.compare_values(1.0, count_regions(&kept) as f64, 0.0);
    rp.compare_values(1.0, kept.get(Coord::new_2d(6, 6)) as f64, 0.0);

    assert!(rp.cleanup(), "label regression test failed");
}
