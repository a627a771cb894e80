use anyhow::Context;
use clap::{CommandFactory, Parser};
use symq_cli::cli::load::LoadCli;
use symq_cli::{cli, commands, logging};
use symq_config::{SymqConfig, merge_flag_lines};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("symq-load error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = SymqConfig::load_with_dotenv().context("failed to load symq configuration")?;
    let raw: Vec<String> = std::env::args().collect();
    let args = merge_flag_lines(
        &raw,
        &config.flags.load,
        &cli::flag_aliases(&LoadCli::command()),
    )?;

    let load = match LoadCli::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(error) => cli::exit_on_parse_error(&error),
    };
    logging::init_tracing(load.quiet, load.verbose_log)?;

    commands::load::handle(&load, &config).await
}
