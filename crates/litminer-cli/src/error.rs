//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No API key from flags, environment or config file
    #[error("No API key for provider '{0}'. Pass --api-key, set LITMINER_API_KEY, or add it to the config file.")]
    MissingApiKey(String),

    /// LLM client construction failed
    #[error(transparent)]
    Llm(#[from] litminer_llm::LlmError),

    /// Pipeline configuration rejected
    #[error(transparent)]
    Pipeline(#[from] litminer_pipeline::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
