//! Error types for the pipeline

use thiserror::Error;

/// Errors reading a CSV table (source or existing sink)
#[derive(Error, Debug)]
pub enum TableError {
    /// Path does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Neither UTF-8 nor a clean decode with the fallback encoding
    #[error("Encoding error in {path}: {message}")]
    Encoding {
        /// Offending file
        path: String,
        /// Decoder diagnostic
        message: String,
    },

    /// Missing header row or ragged rows
    #[error("CSV parse error: {0}")]
    Parse(String),

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self {
        TableError::Parse(e.to_string())
    }
}

/// Errors appending a batch to the output sink
#[derive(Error, Debug)]
pub enum SinkError {
    /// Opening or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the batch failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The existing sink's header could not be read back
    #[error("Existing output unreadable: {0}")]
    Header(#[from] TableError),
}

/// Invalid pipeline configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// TOML could not be parsed
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML could not be produced
    #[error("Failed to serialize to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Run-level failures; reported as a failed run, never returned from `run`
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source table could not be loaded
    #[error("Could not read input file: {0}")]
    Source(#[from] TableError),

    /// The source lacks required columns
    #[error("Input file must contain the columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The configuration failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A pipeline task died outside any record
    #[error("Internal task failure: {0}")]
    Internal(String),
}
