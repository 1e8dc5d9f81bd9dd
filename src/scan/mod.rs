//! Likelihood scans and single-point evaluation.

pub mod evaluate;
pub mod executor;
pub mod grid;

pub use evaluate::{Comparison, compare_with_reference, evaluate};
pub use executor::{DEFAULT_WORKERS, ScanExecutor};
pub use grid::{expand, linspace, validate_axis};
