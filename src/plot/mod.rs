//! Terminal plots of scan reports.

pub mod ascii;

pub use ascii::*;
