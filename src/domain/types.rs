//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - built once at the CLI/JSON boundary and validated there
//! - passed by reference through serialization and scanning
//! - exported to JSON/CSV after a scan

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::validate;

/// Standard-Model Higgs mass (GeV) used when `mass` is unset.
pub const SM_HIGGS_MASS: f64 = 125.09;

/// Reference value of every coupling modifier.
pub const SM_COUPLING: f64 = 1.0;

/// Numeric domain a parameter value must lie in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterDomain {
    /// Coupling modifier, `[-100, 100]`.
    Coupling,
    /// Branching fraction, `[0, 1]`.
    BranchingRatio,
    /// Higgs mass in GeV, `[1, 1000]`.
    Mass,
}

impl ParameterDomain {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            ParameterDomain::Coupling => (-100.0, 100.0),
            ParameterDomain::BranchingRatio => (0.0, 1.0),
            ParameterDomain::Mass => (1.0, 1000.0),
        }
    }
}

/// Closed set of scenario parameters understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParameterName {
    /// Vector-boson coupling (W and Z).
    #[serde(rename = "CV")]
    Cv,
    /// Universal fermion coupling, the fallback for every fermion below.
    #[serde(rename = "CF")]
    Cf,
    #[serde(rename = "Ct")]
    Ct,
    #[serde(rename = "Cb")]
    Cb,
    #[serde(rename = "Cc")]
    Cc,
    #[serde(rename = "Ctau")]
    Ctau,
    #[serde(rename = "Cmu")]
    Cmu,
    /// Effective gluon coupling (loop-induced).
    #[serde(rename = "Cg")]
    Cg,
    /// Effective photon coupling (loop-induced).
    #[serde(rename = "Cgamma")]
    Cgamma,
    /// Effective Z-photon coupling (loop-induced).
    #[serde(rename = "CZgamma")]
    CZgamma,
    /// Invisible branching fraction.
    #[serde(rename = "BRinv")]
    BrInv,
    /// Undetected branching fraction.
    #[serde(rename = "BRundet")]
    BrUndet,
    #[serde(rename = "mass")]
    Mass,
}

impl ParameterName {
    pub const ALL: [ParameterName; 13] = [
        ParameterName::Cv,
        ParameterName::Cf,
        ParameterName::Ct,
        ParameterName::Cb,
        ParameterName::Cc,
        ParameterName::Ctau,
        ParameterName::Cmu,
        ParameterName::Cg,
        ParameterName::Cgamma,
        ParameterName::CZgamma,
        ParameterName::BrInv,
        ParameterName::BrUndet,
        ParameterName::Mass,
    ];

    /// Fermion couplings that fall back to `CF` when unset.
    pub const FERMIONS: [ParameterName; 5] = [
        ParameterName::Ct,
        ParameterName::Cc,
        ParameterName::Cb,
        ParameterName::Ctau,
        ParameterName::Cmu,
    ];

    /// Loop-induced couplings, emitted only when explicitly set.
    pub const LOOP_INDUCED: [ParameterName; 3] =
        [ParameterName::Cg, ParameterName::Cgamma, ParameterName::CZgamma];

    pub fn as_str(self) -> &'static str {
        match self {
            ParameterName::Cv => "CV",
            ParameterName::Cf => "CF",
            ParameterName::Ct => "Ct",
            ParameterName::Cb => "Cb",
            ParameterName::Cc => "Cc",
            ParameterName::Ctau => "Ctau",
            ParameterName::Cmu => "Cmu",
            ParameterName::Cg => "Cg",
            ParameterName::Cgamma => "Cgamma",
            ParameterName::CZgamma => "CZgamma",
            ParameterName::BrInv => "BRinv",
            ParameterName::BrUndet => "BRundet",
            ParameterName::Mass => "mass",
        }
    }

    pub fn domain(self) -> ParameterDomain {
        match self {
            ParameterName::BrInv | ParameterName::BrUndet => ParameterDomain::BranchingRatio,
            ParameterName::Mass => ParameterDomain::Mass,
            _ => ParameterDomain::Coupling,
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ParameterName {
    type Err = ScanError;

    /// Case-insensitive lookup by canonical label (`CV`, `Ctau`, `BRinv`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ParameterName::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScanError::validation(format!("unknown parameter '{s}'")))
    }
}

/// QCD precision used by the engine when computing predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    #[serde(rename = "BEST-QCD")]
    BestQcd,
    #[serde(rename = "LO")]
    Lo,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::BestQcd => "BEST-QCD",
            Precision::Lo => "LO",
        }
    }

    /// Map a user-supplied literal to a precision.
    ///
    /// Anything other than the two exact literals maps to `BEST-QCD` instead of
    /// failing.
    pub fn from_literal(literal: &str) -> Precision {
        match literal {
            "BEST-QCD" => Precision::BestQcd,
            "LO" => Precision::Lo,
            other => {
                log::warn!("unrecognised precision '{other}', using BEST-QCD");
                Precision::BestQcd
            }
        }
    }
}

/// A validated set of scenario parameters.
///
/// Values can only enter through [`ParameterSet::set`], which routes them
/// through the validator, so every stored value lies inside its domain.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParameterSet {
    values: BTreeMap<ParameterName, f64>,
    precision: Precision,
}

impl ParameterSet {
    /// Empty set: every parameter resolves to its Standard-Model value.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(ParameterName, f64)]) -> Result<Self, ScanError> {
        let mut set = Self::new();
        for &(name, value) in pairs {
            set.set(name, value)?;
        }
        Ok(set)
    }

    pub fn set(&mut self, name: ParameterName, value: f64) -> Result<(), ScanError> {
        let value = validate::validate_parameter(name, value)?;
        self.values.insert(name, value);
        Ok(())
    }

    pub fn with(mut self, name: ParameterName, value: f64) -> Result<Self, ScanError> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: ParameterName) -> Option<f64> {
        self.values.get(&name).copied()
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn set_precision(&mut self, precision: Precision) {
        self.precision = precision;
    }

    /// Number of explicitly set parameters.
    pub fn explicit_count(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterName, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    /// Value the engine should see for `name`, after defaults and fallbacks.
    ///
    /// Resolution order for fermions is explicit value, then `CF`, then 1.0.
    /// Loop-induced couplings have no default and resolve to `None` when unset.
    pub fn resolved(&self, name: ParameterName) -> Option<f64> {
        if let Some(v) = self.get(name) {
            return Some(v);
        }
        if ParameterName::LOOP_INDUCED.contains(&name) {
            return None;
        }
        if ParameterName::FERMIONS.contains(&name) {
            return Some(self.get(ParameterName::Cf).unwrap_or(SM_COUPLING));
        }
        match name {
            ParameterName::BrInv | ParameterName::BrUndet => Some(0.0),
            ParameterName::Mass => Some(SM_HIGGS_MASS),
            _ => Some(SM_COUPLING),
        }
    }
}

/// Higgs production modes accepted in signal-strength mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductionMode {
    #[serde(rename = "ggH")]
    Ggh,
    #[serde(rename = "VBF")]
    Vbf,
    #[serde(rename = "WH")]
    Wh,
    #[serde(rename = "ZH")]
    Zh,
    #[serde(rename = "VH")]
    Vh,
    #[serde(rename = "ttH")]
    Tth,
    #[serde(rename = "tH")]
    Th,
}

impl ProductionMode {
    pub const ALL: [ProductionMode; 7] = [
        ProductionMode::Ggh,
        ProductionMode::Vbf,
        ProductionMode::Wh,
        ProductionMode::Zh,
        ProductionMode::Vh,
        ProductionMode::Tth,
        ProductionMode::Th,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductionMode::Ggh => "ggH",
            ProductionMode::Vbf => "VBF",
            ProductionMode::Wh => "WH",
            ProductionMode::Zh => "ZH",
            ProductionMode::Vh => "VH",
            ProductionMode::Tth => "ttH",
            ProductionMode::Th => "tH",
        }
    }
}

impl FromStr for ProductionMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductionMode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                ScanError::validation(format!(
                    "unknown production mode '{s}' (expected one of: {})",
                    join_labels(ProductionMode::ALL.iter().map(|m| m.as_str()))
                ))
            })
    }
}

/// Higgs decay modes accepted in signal-strength mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecayMode {
    #[serde(rename = "gammagamma")]
    GammaGamma,
    #[serde(rename = "ZZ")]
    Zz,
    #[serde(rename = "WW")]
    Ww,
    #[serde(rename = "bb")]
    Bb,
    #[serde(rename = "tautau")]
    TauTau,
    #[serde(rename = "mumu")]
    MuMu,
    #[serde(rename = "cc")]
    Cc,
    #[serde(rename = "Zgamma")]
    ZGamma,
    #[serde(rename = "gg")]
    Gg,
    #[serde(rename = "invisible")]
    Invisible,
}

impl DecayMode {
    pub const ALL: [DecayMode; 10] = [
        DecayMode::GammaGamma,
        DecayMode::Zz,
        DecayMode::Ww,
        DecayMode::Bb,
        DecayMode::TauTau,
        DecayMode::MuMu,
        DecayMode::Cc,
        DecayMode::ZGamma,
        DecayMode::Gg,
        DecayMode::Invisible,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DecayMode::GammaGamma => "gammagamma",
            DecayMode::Zz => "ZZ",
            DecayMode::Ww => "WW",
            DecayMode::Bb => "bb",
            DecayMode::TauTau => "tautau",
            DecayMode::MuMu => "mumu",
            DecayMode::Cc => "cc",
            DecayMode::ZGamma => "Zgamma",
            DecayMode::Gg => "gg",
            DecayMode::Invisible => "invisible",
        }
    }
}

impl FromStr for DecayMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecayMode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                ScanError::validation(format!(
                    "unknown decay mode '{s}' (expected one of: {})",
                    join_labels(DecayMode::ALL.iter().map(|m| m.as_str()))
                ))
            })
    }
}

/// One `mu` value for a production x decay channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalStrengthEntry {
    pub production: ProductionMode,
    pub decay: DecayMode,
    pub mu: f64,
}

/// Experimental dataset the engine compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// Most recent combination of all published results.
    Latest,
    /// 13 TeV results only.
    Run2,
    /// 7/8 TeV results only.
    Run1,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Latest, Dataset::Run2, Dataset::Run1];

    pub fn as_str(self) -> &'static str {
        match self {
            Dataset::Latest => "latest",
            Dataset::Run2 => "run2",
            Dataset::Run1 => "run1",
        }
    }

    /// Dataset list file passed to the engine.
    pub fn list_file(self) -> &'static str {
        match self {
            Dataset::Latest => "data/latest.list",
            Dataset::Run2 => "data/run2.list",
            Dataset::Run1 => "data/run1.list",
        }
    }
}

impl FromStr for Dataset {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate::validate_dataset(s)
    }
}

/// Two-Higgs-doublet model Yukawa structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum TwoHdmType {
    #[serde(rename = "I")]
    #[value(name = "I")]
    TypeI,
    #[serde(rename = "II")]
    #[value(name = "II")]
    TypeII,
    #[serde(rename = "lepton-specific")]
    #[value(name = "lepton-specific")]
    LeptonSpecific,
    #[serde(rename = "flipped")]
    #[value(name = "flipped")]
    Flipped,
}

impl TwoHdmType {
    pub fn display_name(self) -> &'static str {
        match self {
            TwoHdmType::TypeI => "Type I",
            TwoHdmType::TypeII => "Type II",
            TwoHdmType::LeptonSpecific => "Lepton-specific",
            TwoHdmType::Flipped => "Flipped",
        }
    }
}

/// One scanned dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanAxis {
    pub name: ParameterName,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

impl FromStr for ScanAxis {
    type Err = ScanError;

    /// Parse `NAME:MIN:MAX:STEPS`, e.g. `CV:0.8:1.2:21`.
    ///
    /// Only the shape is checked here; ranges are validated by the scan.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [name, min, max, steps] = parts.as_slice() else {
            return Err(ScanError::validation(format!(
                "axis '{s}' must look like NAME:MIN:MAX:STEPS"
            )));
        };
        let parse_f64 = |raw: &str, what: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| ScanError::validation(format!("axis {what} '{raw}' is not a number")))
        };
        Ok(ScanAxis {
            name: name.parse()?,
            min: parse_f64(*min, "min")?,
            max: parse_f64(*max, "max")?,
            steps: steps
                .trim()
                .parse::<usize>()
                .map_err(|_| ScanError::validation(format!("axis steps '{steps}' is not a count")))?,
        })
    }
}

/// A single grid point, ready to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPoint {
    /// Position in generation order (row-major for 2-D).
    pub slot: usize,
    /// Zero-based index along each axis.
    pub index: Vec<usize>,
    /// Coordinate along each axis.
    pub coordinates: Vec<f64>,
    /// Fixed parameters merged with the coordinates.
    pub parameters: ParameterSet,
}

/// Outcome for one grid point.
///
/// `likelihood` is `None` when the engine invocation for this point failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub index: Vec<usize>,
    pub coordinates: Vec<f64>,
    pub likelihood: Option<f64>,
    /// `likelihood - minimum` over all present results.
    pub delta: Option<f64>,
    /// Chi-square p-value of `delta` with one degree of freedom per axis.
    pub p_value: Option<f64>,
}

/// A finished scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub dataset: Dataset,
    pub axes: Vec<ScanAxis>,
    /// Degrees of freedom used for `p_value` (number of axes).
    pub ndf: usize,
    /// Minimum `-2 log L` over present results.
    pub minimum: f64,
    /// Coordinates of the first result attaining `minimum`.
    pub best: Vec<f64>,
    pub failed: usize,
    pub results: Vec<ScanResult>,
}

/// Result of evaluating one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub likelihood: f64,
    pub ndof: Option<u32>,
    /// `P(chi2 >= likelihood)` with `ndof` degrees of freedom, when known.
    pub p_value: Option<f64>,
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}
