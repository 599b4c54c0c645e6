mod clap_command;
mod evaluate;
mod fill;
mod height_model;
mod resolve_tiles;
mod run;
mod zonal;

use clap::{Arg, ArgMatches};

use crate::config::PipelineConfig;

pub use clap_command::{existing_dir, existing_file, output_file, ClapCommand};
pub use evaluate::Evaluate;
pub use fill::Fill;
pub use height_model::HeightModel;
pub use resolve_tiles::ResolveTiles;
pub use run::Run;
pub use zonal::Zonal;

pub trait Command {
    fn description(&self) -> &'static str;
    fn args(&self) -> Vec<Arg<'static>>;
    fn run(&self, args: &ArgMatches, config: &PipelineConfig) -> anyhow::Result<()>;
}

/// Parses an optional numeric argument.
fn number_arg<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(args.value_of(name).map(str::parse).transpose()?)
}
