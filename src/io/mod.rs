//! Input/output helpers.
//!
//! - scan report exports (JSON/CSV) and JSON read-back (`export`)
//! - JSON request files for single-point evaluation (`request`)

pub mod export;
pub mod request;

pub use export::*;
pub use request::*;
