mod align;
mod classify;

use std::collections::HashMap;

use log::info;

pub use align::{align, EvaluationPair};
pub use classify::{classify, BinEdges};

use crate::error::{HeightError, Result};
use crate::feature::{Feature, FeatureCollection, FeatureId, PropertyValue, Reprojector};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use approx::assert_relative_eq;
    use geo::{polygon, MultiPolygon};

    use crate::error::HeightError;
    use crate::evaluate::{evaluate, evaluation_layer, rmse, BinEdges, EvaluationPair};
    use crate::feature::{Feature, FeatureCollection, FeatureId, PropertyValue};

    fn sequence(values: &[Option<f64>]) -> Vec<(FeatureId, Option<f64>)> {
        values.iter().enumerate().map(|(i, v)| (FeatureId(i), *v)).collect()
    }

    #[test]
    fn rmse_over_aligned_pairs() {
        let truth = sequence(&[Some(10.0), None, Some(8.0), Some(5.0)]);
        let estimates = sequence(&[Some(9.0), Some(7.0), None, Some(4.0)]);

        let report = evaluate(&truth, &estimates, &BinEdges::default()).unwrap();

        assert_eq!(report.aligned, 2);
        assert_relative_eq!(report.rmse, 1.0);
    }

    #[test]
    fn rmse_of_nothing_is_an_error() {
        assert!(matches!(rmse(&[]), Err(HeightError::EmptyFeatureSet)));
    }

    #[test]
    fn no_aligned_pairs_is_an_empty_feature_set() {
        let truth = sequence(&[None, Some(3.0)]);
        let estimates = sequence(&[Some(1.0), None]);

        assert!(matches!(
            evaluate(&truth, &estimates, &BinEdges::default()),
            Err(HeightError::EmptyFeatureSet)
        ));
    }

    #[test]
    fn error_percentage_compares_magnitudes() {
        let pair = EvaluationPair { id: FeatureId(0), truth: -4.0, estimate: 3.0 };

        assert_relative_eq!(pair.signed_difference(), -7.0);
        assert_relative_eq!(pair.absolute_difference(), 7.0);
        assert_relative_eq!(pair.error_percentage(), 25.0);
    }

    #[test]
    fn features_outside_the_percentage_range_are_not_retained() {
        // 8 vs 20 is 150 %, a zero ground truth gives an infinite percentage
        let truth = sequence(&[Some(10.0), Some(8.0), Some(0.0), Some(4.0)]);
        let estimates = sequence(&[Some(9.0), Some(20.0), Some(1.0), Some(6.0)]);

        let report = evaluate(&truth, &estimates, &BinEdges::default()).unwrap();

        assert_eq!(report.aligned, 4);
        assert_eq!(report.retained, 2);
        assert_eq!(
            report.features.iter().map(|f| f.pair.id).collect::<Vec<_>>(),
            vec![FeatureId(0), FeatureId(3)]
        );
        // (1 + 2) / 2 and (10 + 50) / 2
        assert_relative_eq!(report.mean_absolute_difference.unwrap(), 1.5);
        assert_relative_eq!(report.mean_error_percentage.unwrap(), 30.0);
        assert_relative_eq!(report.retained_rmse.unwrap(), (2.5f64).sqrt());
        // rmse still covers every aligned pair
        assert_relative_eq!(report.rmse, ((1.0 + 144.0 + 1.0 + 4.0) / 4.0f64).sqrt());
    }

    #[test]
    fn retained_features_carry_their_classes() {
        let report = evaluate(&sequence(&[Some(10.0)]), &sequence(&[Some(12.0)]), &BinEdges::default()).unwrap();
        let feature = &report.features[0];

        // -2 is class 2 signed, 2 is class 3 absolute, 20 % is class 3
        assert_eq!(feature.signed_class, 2);
        assert_eq!(feature.absolute_class, 3);
        assert_eq!(feature.percentage_class, 3);
    }

    #[test]
    fn layer_has_one_feature_per_retained_pair() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let buildings = FeatureCollection::new(
            28992,
            vec![
                Feature { geometry: MultiPolygon(vec![square.clone()]), properties: HashMap::new() },
                Feature { geometry: MultiPolygon(vec![square]), properties: HashMap::new() },
            ],
        );
        let report = evaluate(
            &sequence(&[None, Some(10.0)]),
            &sequence(&[Some(3.0), Some(9.0)]),
            &BinEdges::default(),
        )
        .unwrap();

        let layer = evaluation_layer(&buildings, &report, 28992).unwrap();

        assert_eq!(layer.len(), 1);
        let properties = &layer[0].properties;
        assert_eq!(properties.get("ground_truth"), Some(&PropertyValue::Number(10.0)));
        assert_eq!(properties.get("estimate"), Some(&PropertyValue::Number(9.0)));
        assert_eq!(properties.get("height_difference"), Some(&PropertyValue::Number(1.0)));
        assert_eq!(properties.get("absolute_difference"), Some(&PropertyValue::Number(1.0)));
        assert_eq!(properties.get("error_percentage"), Some(&PropertyValue::Number(10.0)));
        assert_eq!(properties.get("height_difference_class"), Some(&PropertyValue::Number(5.0)));
    }
}

/// Root mean square of `truth - estimate`.
pub fn rmse(pairs: &[EvaluationPair]) -> Result<f64> {
    if pairs.is_empty() {
        return Err(HeightError::EmptyFeatureSet);
    }

    let sum: f64 = pairs.iter().map(|p| p.signed_difference().powi(2)).sum();
    Ok((sum / pairs.len() as f64).sqrt())
}

/// A feature that passed the error percentage filter, with its metric classes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFeature {
    pub pair: EvaluationPair,
    pub signed_class: usize,
    pub absolute_class: usize,
    pub percentage_class: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// features with both ground truth and estimate
    pub aligned: usize,
    /// aligned features whose error percentage lies in [0, 100]
    pub retained: usize,
    pub rmse: f64,
    pub retained_rmse: Option<f64>,
    pub mean_absolute_difference: Option<f64>,
    pub mean_error_percentage: Option<f64>,
    pub features: Vec<ClassifiedFeature>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Scores estimates against ground truth.
///
/// Fails with [`HeightError::EmptyFeatureSet`] when no feature has both values.
pub fn evaluate(
    truth: &[(FeatureId, Option<f64>)],
    estimates: &[(FeatureId, Option<f64>)],
    bins: &BinEdges,
) -> Result<EvaluationReport> {
    let pairs = align(truth, estimates)?;
    let rmse_all = rmse(&pairs)?;

    let kept: Vec<EvaluationPair> = pairs
        .iter()
        .copied()
        .filter(|p| (0.0..=100.0).contains(&p.error_percentage()))
        .collect();

    let features: Vec<ClassifiedFeature> = kept
        .iter()
        .map(|pair| ClassifiedFeature {
            pair: *pair,
            signed_class: classify(pair.signed_difference(), &bins.signed),
            absolute_class: classify(pair.absolute_difference(), &bins.absolute),
            percentage_class: classify(pair.error_percentage(), &bins.percentage),
        })
        .collect();

    let report = EvaluationReport {
        aligned: pairs.len(),
        retained: kept.len(),
        rmse: rmse_all,
        retained_rmse: rmse(&kept).ok(),
        mean_absolute_difference: mean(kept.iter().map(EvaluationPair::absolute_difference)),
        mean_error_percentage: mean(kept.iter().map(EvaluationPair::error_percentage)),
        features,
    };

    info!(
        "ℹ️  RMSE {:.3} over {} feature(s), {} within the error percentage range",
        report.rmse, report.aligned, report.retained
    );

    Ok(report)
}

/// Retained features with their metrics and classes as attributes, geometries
/// taken from `buildings` and reprojected into `target_epsg`.
pub fn evaluation_layer(
    buildings: &FeatureCollection,
    report: &EvaluationReport,
    target_epsg: u32,
) -> Result<FeatureCollection> {
    let reprojector = Reprojector::new(buildings.epsg, target_epsg)?;

    let features = report
        .features
        .iter()
        .map(|f| {
            let pair = &f.pair;
            let source = buildings.get(pair.id.0).ok_or(HeightError::MisalignedSequences {
                position: pair.id.0,
                expected: pair.id.0,
                found: buildings.len(),
            })?;

            let properties: HashMap<String, PropertyValue> = [
                ("ground_truth", pair.truth),
                ("estimate", pair.estimate),
                ("height_difference", pair.signed_difference()),
                ("absolute_difference", pair.absolute_difference()),
                ("error_percentage", pair.error_percentage()),
                ("height_difference_class", f.signed_class as f64),
                ("absolute_difference_class", f.absolute_class as f64),
                ("error_percentage_class", f.percentage_class as f64),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::Number(v)))
            .collect();

            Ok(Feature {
                geometry: reprojector.multi_polygon(&source.geometry)?,
                properties,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection::new(target_epsg, features))
}
