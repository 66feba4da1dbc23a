//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Litminer - Mine structured data from scientific literature with an LLM.
#[derive(Debug, Parser)]
#[command(name = "litminer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Show debug lines from the pipeline
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (default: ~/.litminer/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze every article in a CSV file
    Run(RunArgs),

    /// List supported LLM providers
    Providers,

    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Source CSV with title and abstract columns
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output CSV; results are appended
    #[arg(short, long)]
    pub output: PathBuf,

    /// Prompt template file containing {content_to_analyze}
    #[arg(long)]
    pub prompt: PathBuf,

    /// LLM provider (openai, anthropic, deepseek, moonshot, intern-ai)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model name (default: provider's default model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// API key
    #[arg(long, env = "LITMINER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API endpoint URL (default: provider's endpoint)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Process at most this many new articles (0 = all)
    #[arg(short, long, default_value_t = 0)]
    pub limit: usize,

    /// Skip articles whose UID is already in the output
    #[arg(short, long)]
    pub resume: bool,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Rows buffered between saves
    #[arg(long)]
    pub save_interval: Option<usize>,
}

/// Arguments for the init command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
