//! Coupling-mode documents (`<reducedcouplings>`).

use crate::domain::{ParameterName, ParameterSet};
use crate::error::ScanError;
use crate::input::xml::{self, ensure_finite, format_number};
use crate::input::{DocumentKind, InputDocument};

/// Engine channel label for a per-particle coupling.
fn channel(name: ParameterName) -> Result<&'static str, ScanError> {
    let label = match name {
        ParameterName::Ct => "tt",
        ParameterName::Cc => "cc",
        ParameterName::Cb => "bb",
        ParameterName::Ctau => "tautau",
        ParameterName::Cmu => "mumu",
        ParameterName::Cg => "gg",
        ParameterName::Cgamma => "gammagamma",
        ParameterName::CZgamma => "Zgamma",
        other => {
            return Err(ScanError::serialization(format!("{other} has no coupling channel")));
        }
    };
    Ok(label)
}

/// Build a coupling-mode document from a validated parameter set.
pub fn couplings_document(params: &ParameterSet) -> Result<InputDocument, ScanError> {
    let mass = resolve(params, ParameterName::Mass)?;
    let cv = resolve(params, ParameterName::Cv)?;

    let mut couplings: Vec<(&str, f64)> = vec![("ZZ", cv), ("WW", cv)];
    for name in ParameterName::FERMIONS {
        couplings.push((channel(name)?, resolve(params, name)?));
    }
    // Unset loop couplings are left out so the engine computes the loops.
    for name in ParameterName::LOOP_INDUCED {
        if let Some(value) = params.resolved(name) {
            couplings.push((channel(name)?, ensure_finite(name.as_str(), value)?));
        }
    }

    let br_invisible = resolve(params, ParameterName::BrInv)?;
    let br_undetected = resolve(params, ParameterName::BrUndet)?;
    let precision = params.precision().as_str();

    let body = xml::render("reducedcouplings", &[], |w| {
        xml::text_element(w, "mass", &[], &format_number(mass))?;
        for (label, value) in &couplings {
            xml::text_element(w, "C", &[("to", *label)], &format_number(*value))?;
        }
        xml::open(w, "extraBR", &[])?;
        xml::text_element(w, "BR", &[("to", "invisible")], &format_number(br_invisible))?;
        xml::text_element(w, "BR", &[("to", "undetected")], &format_number(br_undetected))?;
        xml::close(w, "extraBR")?;
        xml::text_element(w, "precision", &[], precision)
    })?;

    Ok(InputDocument::new(DocumentKind::Couplings, body))
}

fn resolve(params: &ParameterSet, name: ParameterName) -> Result<f64, ScanError> {
    let value = params
        .resolved(name)
        .ok_or_else(|| ScanError::serialization(format!("{name} has no value or default")))?;
    ensure_finite(name.as_str(), value)
}
