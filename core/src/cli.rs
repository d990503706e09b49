use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::stage::Operation;

#[derive(Parser, Debug)]
#[command(name = "gkedeploy")]
#[command(author, version, about = "Build, push and roll out docker images to Google Container Engine", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_FILE,
        global = true,
        help = "Configuration file"
    )]
    pub config: PathBuf,

    #[arg(
        short = 'C',
        long = "directory",
        value_name = "DIR",
        global = true,
        help = "Project directory (defaults to the current directory)"
    )]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Updates kubeconfig with the configured cluster settings")]
    Kubeconfig,

    #[command(about = "Builds the docker image and pushes it to Google Container Registry")]
    Push,

    #[command(about = "Deploys the docker image to Google Container Engine")]
    Deploy,
}

impl Commands {
    pub fn operation(&self) -> Operation {
        match self {
            Commands::Kubeconfig => Operation::Kubeconfig,
            Commands::Push => Operation::Push,
            Commands::Deploy => Operation::Deploy,
        }
    }
}

impl Cli {
    pub fn working_directory(&self) -> std::io::Result<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }
}
