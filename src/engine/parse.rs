//! Extraction of numbers from engine output.
//!
//! The engine prints a human-readable summary; only two lines matter:
//!
//! ```text
//! -2log(likelihood) = 63.4021
//! Ndof = 79
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EngineError;

static LIKELIHOOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-2log\(likelihood\)\s*=\s*([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)")
        .expect("likelihood pattern compiles")
});

static NDOF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Ndof\s*=\s*(\d+)").expect("ndof pattern compiles"));

/// First `-2log(likelihood) = <float>` value in `output`.
pub fn parse_likelihood(output: &str) -> Result<f64, EngineError> {
    LIKELIHOOD
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or(EngineError::MissingLikelihood)
}

/// Degrees of freedom reported by the engine, if any.
pub fn parse_ndof(output: &str) -> Option<u32> {
    NDOF.captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
