use std::time::Instant;

use clap::{arg, Arg, ArgMatches};
use log::info;

use super::{existing_file, number_arg, output_file, Command};
use crate::config::PipelineConfig;
use crate::raster::{fill_gaps, load_grid, save_grid};

#[cfg(test)]
mod tests {
    use clap::ArgMatches;

    use crate::commands::{ClapCommand, Fill};
    use crate::config::PipelineConfig;
    use crate::raster::{load_grid, save_grid, GeoTransform, RasterGrid};
    use crate::test::with_input_and_output_paths;

    fn run(args: Vec<&str>) -> anyhow::Result<()> {
        let cmd = ClapCommand::new("fill", Box::new(Fill {}));
        let matches: ArgMatches = cmd.register().try_get_matches_from(args)?;
        cmd.run(&matches, &PipelineConfig::default())
    }

    #[test]
    fn bails_if_input_does_not_exist() {
        with_input_and_output_paths(|_, output_path| {
            let output = output_path.join("out.asc").to_string_lossy().to_string();
            assert!(run(vec!["fill", "-i", "/foo/dtm.asc", "-o", output.as_str()]).is_err());
        })
        .unwrap();
    }

    #[test]
    fn fills_every_missing_cell() {
        with_input_and_output_paths(|input_path, output_path| {
            let grid = RasterGrid::from_rows(
                vec![vec![Some(1.0), None], vec![None, Some(4.0)]],
                GeoTransform::north_up(0.0, 2.0, 1.0),
                28992,
            );
            let input = input_path.join("dtm.asc");
            let output = output_path.join("dtm_filled.asc.gz");
            save_grid(&input, &grid, -9999.0).unwrap();

            let (input_str, output_str) = (input.to_string_lossy().to_string(), output.to_string_lossy().to_string());
            run(vec!["fill", "-i", input_str.as_str(), "-o", output_str.as_str()]).unwrap();

            let filled = load_grid(&output, 28992).unwrap();
            assert_eq!(filled.to_rows(), vec![vec![Some(1.0), Some(1.0)], vec![Some(1.0), Some(4.0)]]);
        })
        .unwrap();
    }
}

pub struct Fill {}

impl Command for Fill {
    fn description(&self) -> &'static str {
        "Fill missing cells of an elevation grid with their nearest measured neighbour."
    }

    fn args(&self) -> Vec<Arg<'static>> {
        vec![
            arg!(-i --input <FILE> "ASCII grid with missing cells"),
            arg!(-o --output <FILE> "Path of the filled grid"),
            arg!(--epsg <CODE> "EPSG code of the grid").required(false),
        ]
    }

    fn run(&self, args: &ArgMatches, config: &PipelineConfig) -> anyhow::Result<()> {
        let start = Instant::now();
        let input = existing_file(args, "input")?;
        let output = output_file(args, "output")?;
        let epsg = number_arg(args, "epsg")?.unwrap_or(config.raster_epsg);

        let now = Instant::now();
        info!("▶️  Loading {}", input.display());
        let grid = load_grid(&input, epsg)?;
        info!("✔️  Loaded grid in {}ms", now.elapsed().as_millis());

        let missing = grid.missing_count();
        info!("ℹ️  {} missing cell(s)", missing);

        let now = Instant::now();
        info!("▶️  Filling gaps");
        let filled = fill_gaps(&grid)?;
        info!("✔️  Filled gaps in {}ms", now.elapsed().as_millis());

        save_grid(&output, &filled, config.output_nodata)?;

        info!("🎉  Finished in {}ms", start.elapsed().as_millis());

        Ok(())
    }
}
