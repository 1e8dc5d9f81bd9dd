//! Statistical post-processing: gamma functions, chi-square tails, and
//! significance buckets.
//!
//! Everything here is pure and allocation-free.

pub mod chi2;
pub mod gamma;

pub use chi2::*;
pub use gamma::*;
