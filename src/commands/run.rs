use std::time::Instant;

use anyhow::bail;
use clap::{Arg, ArgMatches};
use log::info;

use super::{existing_dir, Command};
use crate::config::PipelineConfig;
use crate::pipeline::{read_area_names, run_batch, BatchState, Layout};


pub struct Run {}

impl Command for Run {
    fn description(&self) -> &'static str {
        "Run the whole pipeline for every recorded area below a working directory."
    }

    fn args(&self) -> Vec<Arg<'static>> {
        vec![
            Arg::new("dir")
                .short('d')
                .long("dir")
                .value_name("DIR")
                .takes_value(true)
                .required(true)
                .help("Working directory holding data/ and output/"),
            Arg::new("records")
                .long("records")
                .value_name("FILE")
                .takes_value(true)
                .help("Area names, one per line (default data/nl_records.txt)"),
            Arg::new("force")
                .long("force")
                .help("Process areas again even if they were processed before"),
            Arg::new("names")
                .value_name("NAME")
                .multiple_values(true)
                .help("Areas to process instead of the records file"),
        ]
    }

    fn run(&self, args: &ArgMatches, config: &PipelineConfig) -> anyhow::Result<()> {
        let start = Instant::now();
        let layout = Layout::new(existing_dir(args, "dir")?);

        let names: Vec<String> = match args.values_of("names") {
            Some(values) => values.map(str::to_string).collect(),
            None => {
                let records = args
                    .value_of("records")
                    .map(Into::into)
                    .unwrap_or_else(|| layout.records());
                read_area_names(&records)?
            }
        };
        info!("ℹ️  {} area(s) to process", names.len());

        let state = BatchState::load(&layout.processed())?;
        let (state, report) = run_batch(&names, state, &layout, config, args.is_present("force"));
        state.save(&layout.processed())?;

        for summary in &report.succeeded {
            println!(
                "{}: {} building(s), {} estimated, rmse {:.3}",
                summary.name, summary.buildings, summary.estimated, summary.report.rmse
            );
        }

        info!(
            "🎉  Finished {} area(s), skipped {}, failed {} in {}ms",
            report.succeeded.len(),
            report.skipped.len(),
            report.failed.len(),
            start.elapsed().as_millis()
        );

        if !report.failed.is_empty() {
            let names: Vec<&str> = report.failed.iter().map(|e| e.name.as_str()).collect();
            bail!("{} area(s) failed: {}", names.len(), names.join(", "));
        }

        Ok(())
    }
}
