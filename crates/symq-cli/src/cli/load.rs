use std::path::PathBuf;

use clap::Parser;

use super::OutputFormat;

/// Parser for the `symq-load` binary.
#[derive(Debug, Parser)]
#[command(
    name = "symq-load",
    version,
    about = "Load front-end symbol records (JSON Lines) into a symq index"
)]
pub struct LoadCli {
    /// JSON Lines files, one symbol per line; `-` reads stdin
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Symbol database (defaults to `general.database`)
    #[arg(long, value_name = "PATH")]
    pub db: Option<String>,

    /// Output format for the load summary
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Only log errors
    #[arg(long, conflicts_with = "verbose_log")]
    pub quiet: bool,

    /// Debug logging
    #[arg(long)]
    pub verbose_log: bool,
}
