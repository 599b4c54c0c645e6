use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{arg, ArgMatches};

use super::Command;
use crate::config::PipelineConfig;


/// A subcommand registered under `identifier`.
pub struct ClapCommand {
    pub identifier: String,
    pub exec: Box<dyn Command>,
}

impl ClapCommand {
    pub fn new(identifier: &str, exec: Box<dyn Command>) -> Self {
        ClapCommand {
            identifier: identifier.to_string(),
            exec,
        }
    }

    pub fn register(&self) -> clap::Command<'static> {
        let cmd = clap::Command::new(self.identifier.as_str())
            .about(self.exec.description())
            .arg(arg!(-c --config <FILE> "Path to a JSON pipeline configuration").required(false));

        self.exec.args().into_iter().fold(cmd, |c, a| c.arg(a))
    }

    pub fn run(&self, args: &ArgMatches, config: &PipelineConfig) -> anyhow::Result<()> {
        self.exec.run(args, config)
    }
}

/// Path given for `name`. Only call for arguments that are required.
pub fn path_arg(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    match args.value_of(name) {
        Some(s) => Ok(Path::new(s).to_path_buf()),
        None => bail!("Missing argument --{}", name),
    }
}

pub fn existing_file(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    let path = path_arg(args, name)?;
    if !path.is_file() {
        bail!("{} is not a file", path.display());
    }
    Ok(path)
}

pub fn existing_dir(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    let path = path_arg(args, name)?;
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    Ok(path)
}

/// Output path whose parent directory must already exist.
pub fn output_file(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    let path = path_arg(args, name)?;
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            bail!("Output directory {} does not exist", parent.display())
        }
        _ => Ok(path),
    }
}
