//! Engine input documents.
//!
//! Two document kinds exist: coupling mode and signal-strength mode. Callers
//! resolve which one they want once, at the boundary, into an
//! [`EvaluationInput`]; everything downstream works on the typed variant.

pub mod couplings;
pub mod signal;
pub mod thdm;
mod xml;

use serde_json::Value;

use crate::domain::{ParameterName, ParameterSet, Precision};
use crate::error::ScanError;

pub use couplings::couplings_document;
pub use signal::{SignalStrengths, signal_strength_document};
pub use thdm::two_hdm_couplings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Couplings,
    SignalStrengths,
}

/// A rendered, well-formed XML document ready to hand to an engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputDocument {
    kind: DocumentKind,
    body: String,
}

impl InputDocument {
    pub(crate) fn new(kind: DocumentKind, body: String) -> Self {
        Self { kind, body }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }
}

/// What to evaluate, after the boundary has decided the mode.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationInput {
    Couplings(ParameterSet),
    SignalStrengths(SignalStrengths),
}

impl EvaluationInput {
    pub fn to_document(&self) -> Result<InputDocument, ScanError> {
        match self {
            EvaluationInput::Couplings(params) => couplings_document(params),
            EvaluationInput::SignalStrengths(strengths) => signal_strength_document(strengths),
        }
    }

    /// Resolve a JSON request body.
    ///
    /// ```json
    /// { "mode": "couplings", "parameters": { "CV": 1.02, "precision": "LO" } }
    /// { "mode": "signal_strengths", "mu": { "ggH_gammagamma": 1.1 }, "mass": 125.0 }
    /// ```
    ///
    /// A missing `mode` means coupling mode.
    pub fn from_json(value: &Value) -> Result<Self, ScanError> {
        let object = value
            .as_object()
            .ok_or_else(|| ScanError::validation("input must be a JSON object"))?;

        let mode = match object.get("mode") {
            None => "couplings",
            Some(Value::String(mode)) => mode.as_str(),
            Some(other) => {
                return Err(ScanError::validation(format!(
                    "mode must be a string, got {other}"
                )));
            }
        };

        match mode {
            "couplings" => {
                let mut params = ParameterSet::new();
                if let Some(bag) = object.get("parameters") {
                    let bag = bag
                        .as_object()
                        .ok_or_else(|| ScanError::validation("parameters must be a JSON object"))?;
                    for (key, raw) in bag {
                        if key == "precision" {
                            let literal = raw.as_str().ok_or_else(|| {
                                ScanError::validation("precision must be a string")
                            })?;
                            params.set_precision(Precision::from_literal(literal));
                            continue;
                        }
                        let name: ParameterName = key.parse()?;
                        params.set(name, number(raw, key)?)?;
                    }
                }
                Ok(EvaluationInput::Couplings(params))
            }
            "signal_strengths" => {
                let bag = object
                    .get("mu")
                    .and_then(Value::as_object)
                    .ok_or_else(|| ScanError::validation("signal_strengths mode needs a 'mu' object"))?;
                let pairs = bag
                    .iter()
                    .map(|(key, raw)| Ok((key.as_str(), number(raw, key)?)))
                    .collect::<Result<Vec<_>, ScanError>>()?;
                let mut strengths = SignalStrengths::from_pairs(&pairs)?;
                if let Some(mass) = object.get("mass") {
                    strengths = strengths.with_mass(number(mass, "mass")?)?;
                }
                Ok(EvaluationInput::SignalStrengths(strengths))
            }
            other => Err(ScanError::validation(format!(
                "unknown mode '{other}' (expected couplings or signal_strengths)"
            ))),
        }
    }
}

fn number(raw: &Value, key: &str) -> Result<f64, ScanError> {
    raw.as_f64()
        .ok_or_else(|| ScanError::validation(format!("wrong value shape for '{key}': expected a number, got {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_couplings_bag_becomes_parameter_set() {
        let input = EvaluationInput::from_json(&json!({
            "mode": "couplings",
            "parameters": { "CV": 1.02, "cf": 0.9, "precision": "LO" }
        }))
        .unwrap();

        let EvaluationInput::Couplings(params) = input else {
            panic!("expected coupling mode");
        };
        assert_eq!(params.get(ParameterName::Cv), Some(1.02));
        assert_eq!(params.get(ParameterName::Cf), Some(0.9));
        assert_eq!(params.precision(), Precision::Lo);
    }

    #[test]
    fn missing_mode_defaults_to_couplings() {
        let input = EvaluationInput::from_json(&json!({})).unwrap();
        assert_eq!(input, EvaluationInput::Couplings(ParameterSet::new()));
    }

    #[test]
    fn json_signal_strength_bag() {
        let input = EvaluationInput::from_json(&json!({
            "mode": "signal_strengths",
            "mu": { "ggH_gammagamma": 1.1 },
            "mass": 125.0
        }))
        .unwrap();

        let doc = input.to_document().unwrap();
        assert_eq!(doc.kind(), DocumentKind::SignalStrengths);
        assert!(doc.as_str().contains("<mass>125</mass>"));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let cases = [
            json!([1, 2]),
            json!({ "mode": 3 }),
            json!({ "mode": "widths" }),
            json!({ "parameters": { "CV": "1.0" } }),
            json!({ "parameters": { "Cfoo": 1.0 } }),
            json!({ "parameters": { "CV": 500.0 } }),
            json!({ "mode": "signal_strengths" }),
            json!({ "mode": "signal_strengths", "mu": { "ggH_bb": null } }),
        ];
        for case in cases {
            let err = EvaluationInput::from_json(&case).unwrap_err();
            assert!(matches!(err, ScanError::Validation(_)), "{case}: {err:?}");
        }
    }

    #[test]
    fn identical_documents_collapse_in_a_set() {
        use std::collections::HashSet;

        let sm = EvaluationInput::Couplings(ParameterSet::new());
        let shifted = EvaluationInput::Couplings(ParameterSet::new().with(ParameterName::Cv, 1.1).unwrap());
        let docs: HashSet<InputDocument> = [&sm, &shifted, &sm]
            .into_iter()
            .map(|input| input.to_document().unwrap())
            .collect();
        assert_eq!(docs.len(), 2);
    }
}
