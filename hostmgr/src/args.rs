use clap::Parser;
use std::path::PathBuf;

/// The Command line args to pass to the host manager
#[derive(Parser, Debug, Clone)]
#[clap(version)]
pub struct Args {
    /// The path to load the config file from
    #[clap(short, long, default_value = "hostmgr.yml")]
    pub config: PathBuf,
    /// The path to load the host inventory from instead of the one in the config
    #[clap(short, long)]
    pub inventory: Option<PathBuf>,
}
