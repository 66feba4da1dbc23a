//! Configuration for the pipeline

use crate::error::ConfigError;
use litminer_domain::SamplingParams;
use litminer_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Names of the source columns the pipeline reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Title column (required)
    pub title: String,

    /// Abstract column (required in the header, may be blank per row)
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// UID column; synthesized from the row index when absent
    pub uid: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            title: "Article Title".to_string(),
            abstract_text: "Abstract".to_string(),
            uid: "UID".to_string(),
        }
    }
}

/// Configuration for a mining run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent workers
    pub max_workers: usize,

    /// Pause between task submissions (milliseconds)
    pub submission_delay_ms: u64,

    /// Attempts per record, including the first
    pub max_retries: u32,

    /// Backoff base between attempts (milliseconds)
    pub backoff_unit_ms: u64,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Buffered rows that trigger a flush to the sink
    pub save_interval: usize,

    /// Sampling temperature
    pub temperature: f64,

    /// Nucleus sampling mass
    pub top_p: f64,

    /// Fail instead of substituting characters when the fallback decode is lossy
    pub strict_encoding: bool,

    /// Source column names
    pub columns: ColumnNames,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let sampling = SamplingParams::default();
        Self {
            max_workers: 10,
            submission_delay_ms: 100,
            max_retries: 3,
            backoff_unit_ms: 1_000,
            request_timeout_secs: 120,
            save_interval: 100,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            strict_encoding: false,
            columns: ColumnNames::default(),
        }
    }
}

impl PipelineConfig {
    /// Aggressive preset: more workers, shorter pauses, frequent checkpoints
    pub fn aggressive() -> Self {
        Self {
            max_workers: 20,
            submission_delay_ms: 50,
            request_timeout_secs: 60,
            save_interval: 50,
            ..Self::default()
        }
    }

    /// Lenient preset for rate-limited accounts
    pub fn lenient() -> Self {
        Self {
            max_workers: 4,
            submission_delay_ms: 500,
            max_retries: 5,
            request_timeout_secs: 300,
            save_interval: 20,
            ..Self::default()
        }
    }

    /// Pause between submissions
    pub fn submission_delay(&self) -> Duration {
        Duration::from_millis(self.submission_delay_ms)
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy for the LLM client
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.backoff_unit_ms))
    }

    /// Sampling parameters forwarded with every call
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be greater than 0".into()));
        }
        if self.save_interval == 0 {
            return Err(ConfigError::Invalid("save_interval must be greater than 0".into()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be greater than 0".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be greater than 0".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid("temperature must be within 0.0..=2.0".into()));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ConfigError::Invalid("top_p must be within 0.0..=1.0".into()));
        }
        let columns = [
            ("title", &self.columns.title),
            ("abstract", &self.columns.abstract_text),
            ("uid", &self.columns.uid),
        ];
        for (name, value) in columns {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("column name '{}' must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
