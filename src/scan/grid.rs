//! Scan grid generation.
//!
//! Grids are uniform and inclusive of both edges. A 2-D grid is row-major with
//! the first axis outermost, so slot `i * steps_y + j` holds `(x_i, y_j)`.

use crate::domain::{ParameterSet, ScanAxis, ScanPoint};
use crate::error::ScanError;
use crate::validate::{self, MAX_STEPS_1D, MAX_STEPS_2D};

/// `steps` evenly spaced values from `min` to `max`. One step yields `[min]`.
pub fn linspace(min: f64, max: f64, steps: usize) -> Vec<f64> {
    if steps <= 1 {
        return vec![min];
    }
    let step = (max - min) / (steps as f64 - 1.0);
    (0..steps)
        .map(|i| {
            if i == steps - 1 {
                max
            } else {
                (min + step * i as f64).min(max)
            }
        })
        .collect()
}

/// Check an axis against its parameter's domain and the step cap.
pub fn validate_axis(axis: &ScanAxis, max_steps: usize) -> Result<(), ScanError> {
    let (lo, hi) = axis.name.domain().bounds();
    let min = validate::validate_number(axis.min, &format!("{} min", axis.name), lo, hi)?;
    let max = validate::validate_number(axis.max, &format!("{} max", axis.name), lo, hi)?;
    if min >= max {
        return Err(ScanError::validation(format!(
            "{} range is empty: min {min} must be below max {max}",
            axis.name
        )));
    }
    validate::validate_steps(axis.steps, axis.name.as_str(), max_steps)?;
    Ok(())
}

/// Expand one or two axes into grid points over `fixed`.
///
/// Axis values override any fixed value of the same parameter.
pub fn expand(fixed: &ParameterSet, axes: &[ScanAxis]) -> Result<Vec<ScanPoint>, ScanError> {
    match axes {
        [x] => {
            validate_axis(x, MAX_STEPS_1D)?;
            linspace(x.min, x.max, x.steps)
                .into_iter()
                .enumerate()
                .map(|(i, vx)| {
                    Ok(ScanPoint {
                        slot: i,
                        index: vec![i],
                        coordinates: vec![vx],
                        parameters: fixed.clone().with(x.name, vx)?,
                    })
                })
                .collect()
        }
        [x, y] => {
            validate_axis(x, MAX_STEPS_2D)?;
            validate_axis(y, MAX_STEPS_2D)?;
            if x.name == y.name {
                return Err(ScanError::validation(format!(
                    "both scan axes use {}; pick two different parameters",
                    x.name
                )));
            }
            let xs = linspace(x.min, x.max, x.steps);
            let ys = linspace(y.min, y.max, y.steps);
            let mut points = Vec::with_capacity(xs.len() * ys.len());
            for (i, &vx) in xs.iter().enumerate() {
                for (j, &vy) in ys.iter().enumerate() {
                    points.push(ScanPoint {
                        slot: points.len(),
                        index: vec![i, j],
                        coordinates: vec![vx, vy],
                        parameters: fixed.clone().with(x.name, vx)?.with(y.name, vy)?,
                    });
                }
            }
            Ok(points)
        }
        _ => Err(ScanError::validation(format!(
            "a scan needs one or two axes, got {}",
            axes.len()
        ))),
    }
}
