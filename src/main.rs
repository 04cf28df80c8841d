use clap::Parser;
use colored::Colorize;
use std::process;

use nettopo::cli::{Cli, CliRunner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nettopo=debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let runner = CliRunner::new(&cli);
    if let Err(e) = runner.run(cli.command).await {
        eprintln!("{} {:#}", "error:".red(), e);
        process::exit(1);
    }
}
