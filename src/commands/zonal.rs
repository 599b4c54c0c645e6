use std::time::Instant;

use anyhow::anyhow;
use clap::{arg, Arg, ArgMatches};
use log::info;

use super::{existing_file, number_arg, output_file, Command};
use crate::config::PipelineConfig;
use crate::feature::{load_feature_collection, save_feature_collection};
use crate::raster::load_grid;
use crate::zonal::{estimates_layer, zonal_mean, CellSelection};


pub struct Zonal {}

impl Command for Zonal {
    fn description(&self) -> &'static str {
        "Estimate the height of every building footprint from a height model."
    }

    fn args(&self) -> Vec<Arg<'static>> {
        vec![
            arg!(--raster <FILE> "Height model ASCII grid"),
            arg!(--features <FILE> "GeoJSON building footprints"),
            arg!(-o --output <FILE> "Path of the estimates GeoJSON"),
            arg!(--selection <MODE> "Which cells count for a footprint: touched or centre").required(false),
            arg!(--attribute <NAME> "Name of the estimate attribute").required(false),
            Arg::new("target-epsg")
                .long("target-epsg")
                .value_name("CODE")
                .takes_value(true)
                .help("EPSG code of the written footprints"),
        ]
    }

    fn run(&self, args: &ArgMatches, config: &PipelineConfig) -> anyhow::Result<()> {
        let start = Instant::now();
        let raster_path = existing_file(args, "raster")?;
        let features_path = existing_file(args, "features")?;
        let output = output_file(args, "output")?;

        let selection = match args.value_of("selection") {
            Some(s) => s.parse::<CellSelection>().map_err(|e| anyhow!(e))?,
            None => config.cell_selection,
        };
        let attribute = args.value_of("attribute").unwrap_or(&config.estimate_attribute);
        let target_epsg = number_arg(args, "target-epsg")?.unwrap_or(config.target_epsg);

        let now = Instant::now();
        info!("▶️  Loading inputs");
        let raster = load_grid(&raster_path, config.raster_epsg)?;
        let features = load_feature_collection(&features_path, config.raster_epsg)?;
        info!(
            "✔️  Loaded {} footprint(s) in {}ms",
            features.len(),
            now.elapsed().as_millis()
        );

        let now = Instant::now();
        info!("▶️  Aggregating heights");
        let stats = zonal_mean(&features, &raster, selection)?;
        info!("✔️  Aggregated heights in {}ms", now.elapsed().as_millis());

        save_feature_collection(&output, &estimates_layer(&features, &stats, attribute, target_epsg)?)?;

        info!("🎉  Finished in {}ms", start.elapsed().as_millis());

        Ok(())
    }
}
