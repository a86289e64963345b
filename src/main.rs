use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mergefeeds::app::AppContext;
use mergefeeds::cli::{commands, Cli};
use mergefeeds::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli)?;
    tracing::debug!(?cli, "program flags");

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let ctx = AppContext::new(config, &cli.tokens)
        .with_context(|| format!("loading endpoints from {}", cli.tokens.display()))?;

    let summary = commands::run_merge(&ctx).await?;
    commands::print_summary(&ctx, &summary);

    Ok(ExitCode::from(summary.exit_status()))
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("opening log file {}", cli.log_file.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    let stdout_layer = (!cli.quiet).then(|| fmt::layer());
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
