use clap::{arg, Arg, ArgMatches};
use log::info;

use super::{existing_file, output_file, Command};
use crate::config::PipelineConfig;
use crate::evaluate::{evaluate, evaluation_layer, EvaluationReport};
use crate::feature::{load_feature_collection, save_feature_collection};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use geo::{polygon, MultiPolygon};

    use crate::commands::evaluate::summary_lines;
    use crate::commands::{ClapCommand, Evaluate};
    use crate::config::PipelineConfig;
    use crate::evaluate::{evaluate, BinEdges};
    use crate::feature::{
        load_feature_collection, save_feature_collection, Feature, FeatureCollection, FeatureId, PropertyValue,
    };
    use crate::test::with_input_and_output_paths;

    fn write(path: &Path, rows: Vec<Vec<(&str, PropertyValue)>>) {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let features = rows
            .into_iter()
            .map(|props| Feature {
                geometry: MultiPolygon(vec![square.clone()]),
                properties: props.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<HashMap<_, _>>(),
            })
            .collect();
        save_feature_collection(path, &FeatureCollection::new(28992, features)).unwrap();
    }

    #[test]
    fn writes_the_evaluation_layer() {
        with_input_and_output_paths(|input_path, output_path| {
            let buildings = input_path.join("buildings.geojson");
            let estimates = input_path.join("estimates.json");
            let out = output_path.join("evaluation.geojson");
            write(
                &buildings,
                vec![
                    vec![("dd_h_dak_m", PropertyValue::Number(12.0)), ("h_maaiveld", PropertyValue::Number(2.0))],
                    vec![("dd_h_dak_m", PropertyValue::Null), ("h_maaiveld", PropertyValue::Number(2.0))],
                ],
            );
            write(
                &estimates,
                vec![vec![("MeanValue", PropertyValue::Number(9.0))], vec![("MeanValue", PropertyValue::Number(3.0))]],
            );

            let (b, e, o) = (
                buildings.to_string_lossy().to_string(),
                estimates.to_string_lossy().to_string(),
                out.to_string_lossy().to_string(),
            );
            let cmd = ClapCommand::new("evaluate", Box::new(Evaluate {}));
            let matches = cmd.register().get_matches_from(vec![
                "evaluate",
                "--buildings",
                b.as_str(),
                "--estimates",
                e.as_str(),
                "-o",
                o.as_str(),
            ]);
            cmd.run(&matches, &PipelineConfig::default()).unwrap();

            let layer = load_feature_collection(&out, 28992).unwrap();
            assert_eq!(layer.len(), 1);
            assert_eq!(layer[0].number("height_difference"), Some(1.0));
        })
        .unwrap();
    }

    #[test]
    fn summary_mentions_counts_and_rmse() {
        let truth = vec![(FeatureId(0), Some(10.0)), (FeatureId(1), Some(5.0))];
        let estimates = vec![(FeatureId(0), Some(9.0)), (FeatureId(1), Some(4.0))];
        let report = evaluate(&truth, &estimates, &BinEdges::default()).unwrap();

        let lines = summary_lines(&report);

        assert_eq!(lines[0], "aligned features: 2");
        assert_eq!(lines[1], "retained features: 2");
        assert_eq!(lines[2], "rmse: 1.000");
    }
}

pub struct Evaluate {}

impl Command for Evaluate {
    fn description(&self) -> &'static str {
        "Compare estimated building heights against the heights recorded with the footprints."
    }

    fn args(&self) -> Vec<Arg<'static>> {
        vec![
            arg!(--buildings <FILE> "GeoJSON footprints carrying roof and ground heights"),
            arg!(--estimates <FILE> "GeoJSON estimates in the same feature order"),
            arg!(-o --output <FILE> "Path of the classified evaluation layer").required(false),
        ]
    }

    fn run(&self, args: &ArgMatches, config: &PipelineConfig) -> anyhow::Result<()> {
        let buildings = load_feature_collection(&existing_file(args, "buildings")?, config.raster_epsg)?;
        let estimates = load_feature_collection(&existing_file(args, "estimates")?, config.target_epsg)?;
        info!(
            "ℹ️  Loaded {} building(s) and {} estimate(s)",
            buildings.len(),
            estimates.len()
        );

        let truth = buildings.numeric_difference(&config.roof_attribute, &config.ground_attribute);
        let estimated = estimates.numbers(&config.estimate_attribute);
        let report = evaluate(&truth, &estimated, &config.bins)?;

        for line in summary_lines(&report) {
            println!("{}", line);
        }

        if args.value_of("output").is_some() {
            let output = output_file(args, "output")?;
            save_feature_collection(&output, &evaluation_layer(&buildings, &report, config.target_epsg)?)?;
        }

        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".to_string())
}

fn summary_lines(report: &EvaluationReport) -> Vec<String> {
    vec![
        format!("aligned features: {}", report.aligned),
        format!("retained features: {}", report.retained),
        format!("rmse: {:.3}", report.rmse),
        format!("rmse of retained: {}", optional(report.retained_rmse)),
        format!("mean absolute difference: {}", optional(report.mean_absolute_difference)),
        format!("mean error percentage: {}", optional(report.mean_error_percentage)),
    ]
}
