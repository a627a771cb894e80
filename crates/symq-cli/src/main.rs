use anyhow::Context;
use symq_cli::{cli, commands, logging};
use symq_config::{SymqConfig, merge_flag_lines};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("symq error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = SymqConfig::load_with_dotenv().context("failed to load symq configuration")?;
    let raw: Vec<String> = std::env::args().collect();
    let args = merge_flag_lines(
        &raw,
        &config.flags.query,
        &cli::flag_aliases(&cli::Cli::command_with_columns()),
    )?;

    let (cli, columns) = match cli::Cli::try_parse_args(args) {
        Ok(parsed) => parsed,
        Err(error) => cli::exit_on_parse_error(&error),
    };
    logging::init_tracing(cli.quiet, cli.verbose_log)?;

    commands::query::handle(&cli, &columns, &config).await
}
