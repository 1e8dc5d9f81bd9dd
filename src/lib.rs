//! `higgs-scan` library crate.
//!
//! The binary (`hscan`) is a thin wrapper around this library so that:
//!
//! - input serialization, statistics, and scan scheduling are testable without
//!   a real likelihood engine
//! - the engine seam ([`engine::Engine`]) can be swapped for a stub or a cache

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod input;
pub mod io;
pub mod plot;
pub mod report;
pub mod scan;
pub mod stats;
pub mod validate;
