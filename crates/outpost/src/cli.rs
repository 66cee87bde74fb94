use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Outpost: plugin host for a client node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Configuration file (JSON, YAML or TOML, chosen by extension)
    #[arg(short, long, env = "OUTPOST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print "pong" and exit without starting the node
    #[arg(long)]
    pub ping: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the bundled plugins and the partition the configuration puts them in
    Plugins,
}
