//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the closed parameter vocabulary (`ParameterName`, `Precision`)
//! - validated parameter sets (`ParameterSet`)
//! - enumerations that form the engine input contract
//!   (`ProductionMode`, `DecayMode`, `Dataset`, `TwoHdmType`)
//! - scan inputs and outputs (`ScanAxis`, `ScanPoint`, `ScanResult`, `ScanReport`)

pub mod types;

pub use types::*;
