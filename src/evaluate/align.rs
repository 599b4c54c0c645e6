use crate::error::{HeightError, Result};
use crate::feature::FeatureId;


/// Ground truth and estimate of one feature, both present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationPair {
    pub id: FeatureId,
    pub truth: f64,
    pub estimate: f64,
}

impl EvaluationPair {
    /// `truth - estimate`
    pub fn signed_difference(&self) -> f64 {
        self.truth - self.estimate
    }

    pub fn absolute_difference(&self) -> f64 {
        self.signed_difference().abs()
    }

    /// `||truth| - |estimate|| / |truth| * 100`, infinite or NaN when the truth is zero.
    pub fn error_percentage(&self) -> f64 {
        (self.truth.abs() - self.estimate.abs()).abs() / self.truth.abs() * 100.0
    }
}

/// Pairs up two per-feature sequences, keeping only the features where both
/// values are present.
///
/// Positions without ground truth are removed from both sequences first, then
/// positions without estimate.
pub fn align(
    truth: &[(FeatureId, Option<f64>)],
    estimates: &[(FeatureId, Option<f64>)],
) -> Result<Vec<EvaluationPair>> {
    if truth.len() != estimates.len() {
        return Err(HeightError::SequenceLengthMismatch {
            truth: truth.len(),
            estimates: estimates.len(),
        });
    }

    if let Some((position, ((expected, _), (found, _)))) = truth
        .iter()
        .zip(estimates)
        .enumerate()
        .find(|(_, ((a, _), (b, _)))| a != b)
    {
        return Err(HeightError::MisalignedSequences {
            position,
            expected: expected.0,
            found: found.0,
        });
    }

    let with_truth: Vec<(FeatureId, f64, Option<f64>)> = truth
        .iter()
        .zip(estimates)
        .filter_map(|((id, t), (_, e))| t.map(|t| (*id, t, *e)))
        .collect();

    Ok(with_truth
        .into_iter()
        .filter_map(|(id, truth, estimate)| estimate.map(|estimate| EvaluationPair { id, truth, estimate }))
        .collect())
}
