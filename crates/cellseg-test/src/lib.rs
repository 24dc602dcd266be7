//! cellseg-test - Regression test framework for cellseg
//!
//! Provides the [`RegParams`] check recorder used by every crate's
//! `tests/*_reg.rs` files, plus deterministic synthetic inputs in
//! [`synth`].
//!
//! # Usage
//!
//! ```ignore
//! use cellseg_test::RegParams;
//!
//! let mut rp = RegParams::new("label");
//! rp.compare_values(2.0, count as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "display" for per-check diagnostics

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};
