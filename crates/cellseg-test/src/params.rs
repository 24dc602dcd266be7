//! Regression test parameters and operations

use crate::error::TestError;
use cellseg_core::{CoordIter, Grid, LabelMap};
use std::collections::HashMap;
use std::fmt::Debug;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Compare results and record failures (default)
    #[default]
    Compare,
    /// Compare, and also print per-check diagnostics
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// This structure tracks the state of a regression test, including
/// the test name, current index, mode, and success status.
pub struct RegParams {
    /// Name of the test (e.g., "label")
    pub test_name: String,
    /// Current test index (incremented before each check)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Recorded failures
    failures: Vec<TestError>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// The mode is read from the `REGTEST_MODE` environment variable.
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, err: TestError) -> bool {
        eprintln!("Failure in {}_reg: {}", self.test_name, err);
        self.failures.push(err);
        false
    }

    /// Compare two floating-point values
    ///
    /// Returns `true` if `|expected - actual| <= delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        if self.display() {
            eprintln!("  [{}] expected {} actual {}", self.index, expected, actual);
        }
        let diff = (expected - actual).abs();
        if diff > delta || diff.is_nan() {
            return self.fail(TestError::ValueMismatch {
                index: self.index,
                expected,
                actual,
                delta,
            });
        }
        true
    }

    /// Record a boolean condition as a check
    pub fn check(&mut self, condition: bool) -> bool {
        self.compare_values(1.0, if condition { 1.0 } else { 0.0 }, 0.0)
    }

    /// Compare two grids for exact equality of shape and values
    pub fn compare_grids<T: Copy + Default + PartialEq + Debug>(
        &mut self,
        expected: &Grid<T>,
        actual: &Grid<T>,
    ) -> bool {
        self.index += 1;
        if !expected.same_shape(actual) {
            return self.fail(TestError::GridMismatch {
                index: self.index,
                reason: format!(
                    "shape {:?} vs {:?}",
                    expected.dimensions(),
                    actual.dimensions()
                ),
            });
        }
        for c in CoordIter::new(expected.bounds()) {
            let (e, a) = (expected.get(c), actual.get(c));
            if e != a {
                return self.fail(TestError::GridMismatch {
                    index: self.index,
                    reason: format!("value at {}: expected {:?}, got {:?}", c, e, a),
                });
            }
        }
        true
    }

    /// Compare two label maps as partitions of the foreground
    ///
    /// Passes if both maps have the same background pixels and there is a
    /// one-to-one correspondence between their labels, whatever the label
    /// numbers are.
    pub fn compare_partitions(&mut self, expected: &LabelMap, actual: &LabelMap) -> bool {
        self.index += 1;
        if !expected.same_shape(actual) {
            return self.fail(TestError::GridMismatch {
                index: self.index,
                reason: "shape mismatch".to_string(),
            });
        }
        let mut forward: HashMap<u32, u32> = HashMap::new();
        let mut backward: HashMap<u32, u32> = HashMap::new();
        for c in CoordIter::new(expected.bounds()) {
            let (e, a) = (expected.get(c), actual.get(c));
            if (e == 0) != (a == 0) {
                return self.fail(TestError::GridMismatch {
                    index: self.index,
                    reason: format!("foreground differs at {}", c),
                });
            }
            if e == 0 {
                continue;
            }
            let f = *forward.entry(e).or_insert(a);
            let b = *backward.entry(a).or_insert(e);
            if f != a || b != e {
                return self.fail(TestError::GridMismatch {
                    index: self.index,
                    reason: format!("labels {} / {} split or merged at {}", e, a, c),
                });
            }
        }
        true
    }

    /// Clean up and report results
    ///
    /// Returns `true` if all checks passed.
    pub fn cleanup(self) -> bool {
        if self.failures.is_empty() {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.failures.is_empty()
    }

    /// Check if all checks have passed so far
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Get list of failures
    pub fn failures(&self) -> &[TestError] {
        &self.failures
    }
}
