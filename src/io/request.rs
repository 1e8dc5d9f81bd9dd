//! JSON request files for `hscan eval --input`.

use std::fs::File;
use std::path::Path;

use crate::error::AppError;
use crate::input::EvaluationInput;

/// Read and resolve a request file. Shape errors surface as validation errors.
pub fn read_request_json(path: &Path) -> Result<EvaluationInput, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open input JSON '{}': {e}", path.display())))?;
    let value: serde_json::Value =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid input JSON: {e}")))?;
    Ok(EvaluationInput::from_json(&value)?)
}
