//! Chi-square distribution and significance buckets.

use serde::{Deserialize, Serialize};

use crate::stats::gamma::lower_incomplete_gamma_regularized;

/// Chi-square CDF with `k` degrees of freedom: `P(k/2, x/2)`.
///
/// Returns 0 for `x <= 0` and `NaN` when `k` is not a positive number.
pub fn chi_square_cdf(x: f64, k: f64) -> f64 {
    if !(k > 0.0 && k.is_finite()) {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    lower_incomplete_gamma_regularized(k / 2.0, x / 2.0)
}

/// Upper-tail probability `1 - CDF(chi2, ndf)`.
pub fn chi_square_p_value(chi2: f64, ndf: f64) -> f64 {
    1.0 - chi_square_cdf(chi2, ndf)
}

/// Gaussian-equivalent significance of a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SigmaLevel {
    #[serde(rename = "<1σ")]
    BelowOne,
    #[serde(rename = "1-2σ")]
    OneToTwo,
    #[serde(rename = "2-3σ")]
    TwoToThree,
    #[serde(rename = "3-4σ")]
    ThreeToFour,
    #[serde(rename = "4-5σ")]
    FourToFive,
    #[serde(rename = ">5σ")]
    AboveFive,
}

impl SigmaLevel {
    /// Two-sided Gaussian tail probabilities at 1σ..5σ.
    const THRESHOLDS: [(f64, SigmaLevel); 5] = [
        (0.3173, SigmaLevel::BelowOne),
        (0.0455, SigmaLevel::OneToTwo),
        (0.0027, SigmaLevel::TwoToThree),
        (6.3e-5, SigmaLevel::ThreeToFour),
        (5.7e-7, SigmaLevel::FourToFive),
    ];

    pub fn from_p_value(p: f64) -> SigmaLevel {
        for &(threshold, level) in &Self::THRESHOLDS {
            if p > threshold {
                return level;
            }
        }
        SigmaLevel::AboveFive
    }

    pub fn label(self) -> &'static str {
        match self {
            SigmaLevel::BelowOne => "<1σ",
            SigmaLevel::OneToTwo => "1-2σ",
            SigmaLevel::TwoToThree => "2-3σ",
            SigmaLevel::ThreeToFour => "3-4σ",
            SigmaLevel::FourToFive => "4-5σ",
            SigmaLevel::AboveFive => ">5σ",
        }
    }
}
