//! Single-scenario evaluation.

use serde::{Deserialize, Serialize};

use crate::domain::{Dataset, Evaluation, ParameterName, ParameterSet};
use crate::engine::{Engine, parse_likelihood, parse_ndof};
use crate::error::ScanError;
use crate::input::EvaluationInput;
use crate::stats::{SigmaLevel, chi_square_p_value};

/// Serialize, run, and parse one scenario. Engine failures are errors here,
/// unlike in a scan.
pub fn evaluate<E: Engine + ?Sized>(
    engine: &E,
    input: &EvaluationInput,
    dataset: Dataset,
) -> Result<Evaluation, ScanError> {
    let document = input.to_document()?;
    let output = engine.evaluate(&document, dataset)?;
    let likelihood = parse_likelihood(&output)?;
    let ndof = parse_ndof(&output);
    let p_value = ndof
        .filter(|&n| n > 0)
        .map(|n| chi_square_p_value(likelihood, f64::from(n)));

    log::debug!("evaluated on {}: -2logL = {likelihood}, ndof = {ndof:?}", dataset.as_str());
    Ok(Evaluation {
        likelihood,
        ndof,
        p_value,
    })
}

/// A hypothesis measured against the Standard-Model reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub hypothesis: Evaluation,
    pub reference: Evaluation,
    /// `L(hypothesis) - L(reference)`; negative when the hypothesis fits better.
    pub delta: f64,
    pub ndf: usize,
    /// `P(chi2 >= delta)`; 1 when the hypothesis fits at least as well.
    pub p_value: f64,
    pub sigma: SigmaLevel,
}

/// Evaluate `params` and the Standard-Model point on the same dataset.
///
/// The reference keeps the hypothesis' mass and precision, so only the
/// couplings differ. Degrees of freedom are the number of explicitly set
/// parameters, at least one.
pub fn compare_with_reference<E: Engine + ?Sized>(
    engine: &E,
    params: &ParameterSet,
    dataset: Dataset,
) -> Result<Comparison, ScanError> {
    let mut reference = ParameterSet::new();
    reference.set_precision(params.precision());
    if let Some(mass) = params.get(ParameterName::Mass) {
        reference.set(ParameterName::Mass, mass)?;
    }

    let hypothesis = evaluate(engine, &EvaluationInput::Couplings(params.clone()), dataset)?;
    let reference = evaluate(engine, &EvaluationInput::Couplings(reference), dataset)?;

    let delta = hypothesis.likelihood - reference.likelihood;
    let ndf = params.explicit_count().max(1);
    let p_value = chi_square_p_value(delta, ndf as f64);
    Ok(Comparison {
        hypothesis,
        reference,
        delta,
        ndf,
        p_value,
        sigma: SigmaLevel::from_p_value(p_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::input::{InputDocument, SignalStrengths};

    /// Scores CV distance from 1 and reports a fixed Ndof.
    struct Fixed;

    impl Engine for Fixed {
        fn evaluate(&self, doc: &InputDocument, _: Dataset) -> Result<String, EngineError> {
            let l = if doc.as_str().contains("<C to=\"ZZ\">1</C>") { 40.0 } else { 46.0 };
            Ok(format!("-2log(likelihood) = {l}\nNdof = 38\n"))
        }
    }

    #[test]
    fn evaluation_reports_likelihood_and_p_value() {
        let eval = evaluate(
            &Fixed,
            &EvaluationInput::Couplings(ParameterSet::new()),
            Dataset::Latest,
        )
        .unwrap();
        assert_eq!(eval.likelihood, 40.0);
        assert_eq!(eval.ndof, Some(38));
        let p = eval.p_value.unwrap();
        assert!(p > 0.3 && p < 0.5, "{p}");
    }

    #[test]
    fn missing_likelihood_is_a_hard_error() {
        struct Silent;
        impl Engine for Silent {
            fn evaluate(&self, _: &InputDocument, _: Dataset) -> Result<String, EngineError> {
                Ok("Ndof = 3".to_string())
            }
        }
        let input = EvaluationInput::SignalStrengths(
            SignalStrengths::from_pairs(&[("ggH_ZZ", 1.0)]).unwrap(),
        );
        let err = evaluate(&Silent, &input, Dataset::Run1).unwrap_err();
        assert_eq!(err, ScanError::Engine(EngineError::MissingLikelihood));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn comparison_counts_explicit_parameters() {
        let params = ParameterSet::from_pairs(&[
            (ParameterName::Cv, 1.2),
            (ParameterName::Cf, 0.9),
        ])
        .unwrap();
        let cmp = compare_with_reference(&Fixed, &params, Dataset::Latest).unwrap();

        assert_eq!(cmp.reference.likelihood, 40.0);
        assert_eq!(cmp.hypothesis.likelihood, 46.0);
        assert_eq!(cmp.delta, 6.0);
        assert_eq!(cmp.ndf, 2);
        // chi2 = 6 with 2 dof: p = e^-3.
        assert!((cmp.p_value - (-3.0_f64).exp()).abs() < 1e-8);
        assert_eq!(cmp.sigma, SigmaLevel::OneToTwo);
    }

    #[test]
    fn better_than_reference_has_unit_p_value() {
        struct Inverted;
        impl Engine for Inverted {
            fn evaluate(&self, doc: &InputDocument, _: Dataset) -> Result<String, EngineError> {
                let l = if doc.as_str().contains("<C to=\"ZZ\">1</C>") { 46.0 } else { 40.0 };
                Ok(format!("-2log(likelihood) = {l}"))
            }
        }
        let params = ParameterSet::new().with(ParameterName::Cv, 0.9).unwrap();
        let cmp = compare_with_reference(&Inverted, &params, Dataset::Latest).unwrap();
        assert_eq!(cmp.delta, -6.0);
        assert_eq!(cmp.ndf, 1);
        assert_eq!(cmp.p_value, 1.0);
        assert_eq!(cmp.sigma, SigmaLevel::BelowOne);
        assert_eq!(cmp.hypothesis.p_value, None);
    }
}
