//! Signal-strength documents (`<signalstrengths>`).

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{DecayMode, ProductionMode, SM_HIGGS_MASS, SignalStrengthEntry};
use crate::error::ScanError;
use crate::input::xml::{self, ensure_finite, format_number};
use crate::input::{DocumentKind, InputDocument};
use crate::validate;

/// A validated, non-empty list of signal strengths.
///
/// Entries keep their input order; each production x decay pair appears at
/// most once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalStrengths {
    mass: f64,
    entries: Vec<SignalStrengthEntry>,
}

impl SignalStrengths {
    /// Build from `("<production>_<decay>", mu)` pairs.
    ///
    /// The whole call fails on the first bad key or value.
    pub fn from_pairs<K: AsRef<str>>(pairs: &[(K, f64)]) -> Result<Self, ScanError> {
        if pairs.is_empty() {
            return Err(ScanError::validation("at least one signal strength is required"));
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(pairs.len());
        for (key, mu) in pairs {
            let key = key.as_ref();
            let (production, decay) = parse_key(key)?;
            let mu = validate::validate_signal_strength(*mu, key)?;
            if !seen.insert((production, decay)) {
                return Err(ScanError::validation(format!("duplicate signal strength '{key}'")));
            }
            entries.push(SignalStrengthEntry { production, decay, mu });
        }

        Ok(Self {
            mass: SM_HIGGS_MASS,
            entries,
        })
    }

    pub fn with_mass(mut self, mass: f64) -> Result<Self, ScanError> {
        self.mass = validate::validate_number(mass, "mass", 1.0, 1000.0)?;
        Ok(self)
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn entries(&self) -> &[SignalStrengthEntry] {
        &self.entries
    }
}

/// Split `ggH_gammagamma` into its two enumerated tokens.
fn parse_key(key: &str) -> Result<(ProductionMode, DecayMode), ScanError> {
    let tokens: Vec<&str> = key.split('_').collect();
    let [production, decay] = tokens.as_slice() else {
        return Err(ScanError::validation(format!(
            "signal strength key '{key}' must look like <production>_<decay>"
        )));
    };
    if production.is_empty() || decay.is_empty() {
        return Err(ScanError::validation(format!(
            "signal strength key '{key}' has an empty token"
        )));
    }
    Ok((production.parse()?, decay.parse()?))
}

/// Build a signal-strength document.
pub fn signal_strength_document(strengths: &SignalStrengths) -> Result<InputDocument, ScanError> {
    let mass = ensure_finite("mass", strengths.mass)?;
    let mut lines = Vec::with_capacity(strengths.entries.len());
    for entry in &strengths.entries {
        let key = format!("{}_{}", entry.production.as_str(), entry.decay.as_str());
        lines.push((entry.production.as_str(), entry.decay.as_str(), ensure_finite(&key, entry.mu)?));
    }

    let body = xml::render("signalstrengths", &[("part", "h")], |w| {
        xml::text_element(w, "mass", &[], &format_number(mass))?;
        for (production, decay, mu) in &lines {
            xml::text_element(
                w,
                "mu",
                &[("prod", *production), ("decay", *decay)],
                &format_number(*mu),
            )?;
        }
        Ok(())
    })?;

    Ok(InputDocument::new(DocumentKind::SignalStrengths, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: ScanError) -> String {
        match err {
            ScanError::Validation(msg) => msg,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn builds_document_in_input_order() {
        let strengths =
            SignalStrengths::from_pairs(&[("ggH_gammagamma", 1.1), ("VBF_WW", 0.9)]).unwrap();
        let doc = signal_strength_document(&strengths).unwrap();
        let text = doc.as_str();

        assert_eq!(doc.kind(), DocumentKind::SignalStrengths);
        assert!(text.contains("<signalstrengths part=\"h\">"));
        assert!(text.contains("<mass>125.09</mass>"));
        let first = text.find("<mu prod=\"ggH\" decay=\"gammagamma\">1.1</mu>").unwrap();
        let second = text.find("<mu prod=\"VBF\" decay=\"WW\">0.9</mu>").unwrap();
        assert!(first < second);
    }

    #[test]
    fn unknown_production_mode_is_named() {
        let err = SignalStrengths::from_pairs(&[("invalidProd_gammagamma", 1.0)]).unwrap_err();
        assert!(message(err).contains("production mode"));
    }

    #[test]
    fn unknown_decay_mode_is_named() {
        let err = SignalStrengths::from_pairs(&[("ggH_invalidDecay", 1.0)]).unwrap_err();
        assert!(message(err).contains("decay mode"));
    }

    #[test]
    fn mu_out_of_range_or_nan_is_rejected() {
        assert!(SignalStrengths::from_pairs(&[("ggH_gammagamma", 200.0)]).is_err());
        assert!(SignalStrengths::from_pairs(&[("ggH_gammagamma", f64::NAN)]).is_err());
        assert!(SignalStrengths::from_pairs(&[("ggH_gammagamma", -100.0)]).is_ok());
    }

    #[test]
    fn one_bad_entry_fails_the_whole_call() {
        let pairs = [("ggH_gammagamma", 1.0), ("ttH_bb", f64::INFINITY)];
        assert!(SignalStrengths::from_pairs(&pairs).is_err());
    }

    #[test]
    fn malformed_keys_are_rejected() {
        for key in ["ggH", "ggH_", "_bb", "ggH_bb_extra", ""] {
            assert!(SignalStrengths::from_pairs(&[(key, 1.0)]).is_err(), "{key:?}");
        }
    }

    #[test]
    fn duplicates_and_empty_input_are_rejected() {
        assert!(SignalStrengths::from_pairs(&[("ggH_ZZ", 1.0), ("ggH_ZZ", 1.2)]).is_err());
        let none: [(&str, f64); 0] = [];
        assert!(SignalStrengths::from_pairs(&none).is_err());
    }

    #[test]
    fn mass_override_is_validated() {
        let strengths = SignalStrengths::from_pairs(&[("VH_bb", 1.0)]).unwrap();
        assert!(strengths.clone().with_mass(0.0).is_err());
        let strengths = strengths.with_mass(125.4).unwrap();
        let doc = signal_strength_document(&strengths).unwrap();
        assert!(doc.as_str().contains("<mass>125.4</mass>"));
    }
}
