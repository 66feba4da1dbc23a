//! Litminer CLI - Mine structured data from scientific literature with an LLM.

use anyhow::Context;
use clap::Parser;
use litminer_cli::commands;
use litminer_cli::{Cli, Command, Config, Formatter};
use litminer_pipeline::RunStatus;
use tracing_subscriber::EnvFilter;

const EXIT_FAILED: i32 = 1;
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    // Pipeline lines already reach the terminal through the event channel,
    // so tracing stays silent unless RUST_LOG asks for it.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_FAILED);
        }
    }
}

async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    let formatter = Formatter::new(!cli.no_color);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::default_path()?,
    };

    match cli.command {
        Command::Providers => {
            commands::execute_providers(&formatter);
            Ok(0)
        }
        Command::Init(args) => {
            commands::execute_init(args, &config_path, &formatter)?;
            Ok(0)
        }
        Command::Run(args) => {
            let config = Config::load(Some(config_path.as_path()))
                .with_context(|| format!("Failed to load {}", config_path.display()))?;
            let report = commands::execute_run(args, &config, formatter, cli.verbose).await?;
            Ok(match report.status {
                RunStatus::Failed(_) => EXIT_FAILED,
                RunStatus::Cancelled => EXIT_CANCELLED,
                _ if report.unsaved > 0 => EXIT_FAILED,
                _ => 0,
            })
        }
    }
}
