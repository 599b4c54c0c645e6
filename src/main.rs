use clap::{command, ArgMatches};
use log::debug;

use crate::commands::{ClapCommand, Evaluate, Fill, HeightModel, ResolveTiles, Run, Zonal};
use crate::config::PipelineConfig;

mod commands;
mod config;
mod error;
mod evaluate;
mod feature;
mod pipeline;
mod raster;
#[cfg(test)]
mod test;
mod tiles;
mod zonal;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let args: Vec<_> = std::env::args().collect();

    if let Err(e) = execute(&args) {
        println!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &ArgMatches) -> anyhow::Result<PipelineConfig> {
    match args.value_of("config") {
        Some(path) => {
            debug!("reading configuration from {}", path);
            Ok(PipelineConfig::from_file(std::path::Path::new(path))?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn execute(input: &[String]) -> anyhow::Result<()> {
    let commands: Vec<ClapCommand> = vec![
        ClapCommand::new("fill", Box::new(Fill {})),
        ClapCommand::new("height-model", Box::new(HeightModel {})),
        ClapCommand::new("resolve-tiles", Box::new(ResolveTiles {})),
        ClapCommand::new("zonal", Box::new(Zonal {})),
        ClapCommand::new("evaluate", Box::new(Evaluate {})),
        ClapCommand::new("run", Box::new(Run {})),
        // Add commands here
    ];

    let mut app = command!()
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true);

    app = commands.iter().fold(app, |a, c| a.subcommand(c.register()));

    let matches = app.get_matches_from(input);

    match matches.subcommand() {
        Some((name, sub_matches)) => match commands.iter().find(|c| c.identifier == name) {
            Some(command) => command.run(sub_matches, &load_config(sub_matches)?),
            _ => unreachable!(),
        },
        _ => unreachable!(),
    }
}
