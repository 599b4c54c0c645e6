use std::time::Instant;

use clap::{arg, Arg, ArgMatches};
use log::info;

use super::{existing_file, number_arg, output_file, Command};
use crate::config::PipelineConfig;
use crate::raster::{difference, fill_gaps, load_grid, save_grid};


pub struct HeightModel {}

impl Command for HeightModel {
    fn description(&self) -> &'static str {
        "Subtract a terrain model from a surface model to get heights above ground."
    }

    fn args(&self) -> Vec<Arg<'static>> {
        vec![
            arg!(--dsm <FILE> "Surface model ASCII grid"),
            arg!(--dtm <FILE> "Terrain model ASCII grid"),
            arg!(-o --output <FILE> "Path of the height model grid"),
            arg!(--ceiling <METRES> "Heights above this are treated as noise").required(false),
            Arg::new("fill-dtm")
                .long("fill-dtm")
                .help("Fill missing terrain cells before subtracting"),
            arg!(--epsg <CODE> "EPSG code of both grids").required(false),
        ]
    }

    fn run(&self, args: &ArgMatches, config: &PipelineConfig) -> anyhow::Result<()> {
        let start = Instant::now();
        let dsm_path = existing_file(args, "dsm")?;
        let dtm_path = existing_file(args, "dtm")?;
        let output = output_file(args, "output")?;
        let ceiling = number_arg(args, "ceiling")?.unwrap_or(config.height_ceiling);
        let epsg = number_arg(args, "epsg")?.unwrap_or(config.raster_epsg);

        let now = Instant::now();
        info!("▶️  Loading grids");
        let dsm = load_grid(&dsm_path, epsg)?;
        let mut dtm = load_grid(&dtm_path, epsg)?;
        info!("✔️  Loaded grids in {}ms", now.elapsed().as_millis());

        if args.is_present("fill-dtm") {
            let now = Instant::now();
            info!("▶️  Filling terrain model");
            dtm = fill_gaps(&dtm)?;
            info!("✔️  Filled terrain model in {}ms", now.elapsed().as_millis());
        }

        let now = Instant::now();
        info!("▶️  Subtracting");
        let height_model = difference(&dsm, &dtm, ceiling)?;
        info!("✔️  Built height model in {}ms", now.elapsed().as_millis());

        save_grid(&output, &height_model, config.output_nodata)?;

        info!("🎉  Finished in {}ms", start.elapsed().as_millis());

        Ok(())
    }
}
