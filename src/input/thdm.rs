//! Two-Higgs-doublet model couplings for the light CP-even state.
//!
//! With `s = sin(β-α)` and `c = cos(β-α)`:
//!
//! ```text
//! CV         = s
//! up-like    = s + c / tanβ
//! down-like  = s - c · tanβ
//! ```
//!
//! Up-type quarks always take the up-like value. The Yukawa type decides
//! which of down quarks and charged leptons take the down-like one.

use crate::domain::{ParameterName, ParameterSet, TwoHdmType};
use crate::error::ScanError;
use crate::validate;

/// `tanβ` must be positive; this is its upper edge.
pub const MAX_TAN_BETA: f64 = 100.0;

/// Map a 2HDM benchmark onto reduced couplings.
pub fn two_hdm_couplings(
    model: TwoHdmType,
    tan_beta: f64,
    cos_beta_alpha: f64,
) -> Result<ParameterSet, ScanError> {
    let tan_beta = validate::validate_number(tan_beta, "tanβ", f64::MIN_POSITIVE, MAX_TAN_BETA)?;
    let c = validate::validate_number(cos_beta_alpha, "cos(β-α)", -1.0, 1.0)?;
    let s = (1.0 - c * c).max(0.0).sqrt();

    let up = s + c / tan_beta;
    let down = s - c * tan_beta;
    let (quark_down, lepton) = match model {
        TwoHdmType::TypeI => (up, up),
        TwoHdmType::TypeII => (down, down),
        TwoHdmType::LeptonSpecific => (up, down),
        TwoHdmType::Flipped => (down, up),
    };

    ParameterSet::from_pairs(&[
        (ParameterName::Cv, s),
        (ParameterName::Ct, up),
        (ParameterName::Cc, up),
        (ParameterName::Cb, quark_down),
        (ParameterName::Ctau, lepton),
        (ParameterName::Cmu, lepton),
    ])
}
