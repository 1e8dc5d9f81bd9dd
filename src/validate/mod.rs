//! Range and shape checks shared by serialization and scanning.
//!
//! Every numeric value that reaches a document or an engine call passes
//! through one of these functions. The `Option` wrappers distinguish "not
//! provided" (`Ok(None)`) from "provided but invalid" (`Err`).

use crate::domain::{Dataset, ParameterDomain, ParameterName};
use crate::error::ScanError;

/// Upper bound on steps for a 1-D scan.
pub const MAX_STEPS_1D: usize = 1000;
/// Upper bound on steps per axis for a 2-D scan.
pub const MAX_STEPS_2D: usize = 100;
/// Upper bound on concurrent engine invocations.
pub const MAX_WORKERS: usize = 64;

/// Check that `value` is finite and inside `[min, max]`.
pub fn validate_number(value: f64, name: &str, min: f64, max: f64) -> Result<f64, ScanError> {
    if !value.is_finite() {
        return Err(ScanError::validation(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    if value < min || value > max {
        return Err(ScanError::validation(format!(
            "{name} must be within [{min}, {max}], got {value}"
        )));
    }
    Ok(value)
}

pub fn validate_coupling(value: Option<f64>, name: &str) -> Result<Option<f64>, ScanError> {
    validate_in_domain(value, name, ParameterDomain::Coupling)
}

pub fn validate_branching_ratio(value: Option<f64>, name: &str) -> Result<Option<f64>, ScanError> {
    validate_in_domain(value, name, ParameterDomain::BranchingRatio)
}

pub fn validate_mass(value: Option<f64>, name: &str) -> Result<Option<f64>, ScanError> {
    validate_in_domain(value, name, ParameterDomain::Mass)
}

/// Validate a value for a specific parameter against that parameter's domain.
pub fn validate_parameter(name: ParameterName, value: f64) -> Result<f64, ScanError> {
    let checked = match name.domain() {
        ParameterDomain::Coupling => validate_coupling(Some(value), name.as_str())?,
        ParameterDomain::BranchingRatio => validate_branching_ratio(Some(value), name.as_str())?,
        ParameterDomain::Mass => validate_mass(Some(value), name.as_str())?,
    };
    // A provided value never validates to "not provided".
    checked.ok_or_else(|| ScanError::validation(format!("{name} is required")))
}

/// Signal strengths share the coupling range.
pub fn validate_signal_strength(value: f64, key: &str) -> Result<f64, ScanError> {
    let (min, max) = ParameterDomain::Coupling.bounds();
    validate_number(value, &format!("signal strength '{key}'"), min, max)
}

pub fn validate_steps(steps: usize, name: &str, max: usize) -> Result<usize, ScanError> {
    if steps == 0 || steps > max {
        return Err(ScanError::validation(format!(
            "{name} steps must be within [1, {max}], got {steps}"
        )));
    }
    Ok(steps)
}

pub fn validate_workers(workers: usize) -> Result<usize, ScanError> {
    if workers == 0 || workers > MAX_WORKERS {
        return Err(ScanError::validation(format!(
            "workers must be within [1, {MAX_WORKERS}], got {workers}"
        )));
    }
    Ok(workers)
}

/// Only the whitelisted identifiers are accepted; matching is exact.
pub fn validate_dataset(name: &str) -> Result<Dataset, ScanError> {
    Dataset::ALL
        .iter()
        .copied()
        .find(|d| d.as_str() == name)
        .ok_or_else(|| {
            let allowed: Vec<&str> = Dataset::ALL.iter().map(|d| d.as_str()).collect();
            ScanError::validation(format!(
                "unknown dataset '{name}' (expected one of: {})",
                allowed.join(", ")
            ))
        })
}

fn validate_in_domain(
    value: Option<f64>,
    name: &str,
    domain: ParameterDomain,
) -> Result<Option<f64>, ScanError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let (min, max) = domain.bounds();
    validate_number(value, name, min, max).map(Some)
}
