//! Analysis results and per-record failures

use serde_json::{Map, Value};
use thiserror::Error;

/// Fields extracted by the model, in the order the model returned them
pub type ExtractedFields = Map<String, Value>;

/// Outcome of analyzing one document
///
/// Failures are first-class values: they are written to the output as an
/// `error` column and never abort the run.
pub type AnalysisResult = Result<ExtractedFields, TaskFailure>;

/// Why a model response could not be turned into extracted fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// No brace-delimited span in the answer text
    NoJsonFound,
    /// A span was found but is not valid JSON
    JsonDecode,
    /// The provider envelope did not contain an answer where expected
    UnexpectedEnvelope,
}

/// Per-record failure kinds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskFailure {
    /// Title empty or whitespace-only; no network call was made
    #[error("Missing Title")]
    MissingTitle,

    /// Template lacks the content placeholder
    #[error("Invalid Prompt Template")]
    InvalidPromptTemplate,

    /// Model answered, but the answer could not be parsed
    #[error("{}: {detail}", reason_label(.reason))]
    MalformedResponse {
        /// What went wrong
        reason: MalformedReason,
        /// Parser or envelope diagnostic
        detail: String,
        /// The raw answer text (or envelope) as received
        raw: String,
    },

    /// Every attempt failed at the transport or HTTP level
    #[error("API Failure after retries ({attempts} attempts): {last_error}")]
    ExhaustedRetries {
        /// Number of attempts made
        attempts: u32,
        /// Last transport/HTTP error observed
        last_error: String,
    },

    /// Anything else that went wrong inside a task (e.g. a panic)
    #[error("{0}")]
    Unexpected(String),
}

fn reason_label(reason: &MalformedReason) -> &'static str {
    match reason {
        MalformedReason::NoJsonFound => "No JSON found in response",
        MalformedReason::JsonDecode => "JSON Decode Error",
        MalformedReason::UnexpectedEnvelope => "API Format Error",
    }
}

impl TaskFailure {
    /// Value written to the `error` column of the output row
    pub fn label(&self) -> String {
        match self {
            TaskFailure::MissingTitle => "Missing Title".to_string(),
            TaskFailure::InvalidPromptTemplate => "Invalid Prompt Template".to_string(),
            TaskFailure::MalformedResponse { reason, .. } => reason_label(reason).to_string(),
            TaskFailure::ExhaustedRetries { .. } => "API Failure after retries".to_string(),
            TaskFailure::Unexpected(message) => message.clone(),
        }
    }

    /// Raw model text carried by malformed-response failures
    pub fn raw_content(&self) -> Option<&str> {
        match self {
            TaskFailure::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Shorthand for a malformed-response failure
    pub fn malformed(reason: MalformedReason, detail: impl Into<String>, raw: impl Into<String>) -> Self {
        TaskFailure::MalformedResponse {
            reason,
            detail: detail.into(),
            raw: raw.into(),
        }
    }
}

/// Sampling parameters forwarded to the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Sampling temperature
    pub temperature: f64,
    /// Nucleus sampling mass
    pub top_p: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_error_column_values() {
        assert_eq!(TaskFailure::MissingTitle.label(), "Missing Title");
        assert_eq!(TaskFailure::InvalidPromptTemplate.label(), "Invalid Prompt Template");
        assert_eq!(
            TaskFailure::malformed(MalformedReason::NoJsonFound, "none", "text").label(),
            "No JSON found in response"
        );
        assert_eq!(
            TaskFailure::malformed(MalformedReason::JsonDecode, "eof", "{").label(),
            "JSON Decode Error"
        );
        assert_eq!(
            TaskFailure::malformed(MalformedReason::UnexpectedEnvelope, "no choices", "{}").label(),
            "API Format Error"
        );
        assert_eq!(
            TaskFailure::ExhaustedRetries { attempts: 3, last_error: "timeout".into() }.label(),
            "API Failure after retries"
        );
        assert_eq!(TaskFailure::Unexpected("boom".into()).label(), "boom");
    }

    #[test]
    fn test_raw_content_only_for_malformed() {
        let failure = TaskFailure::malformed(MalformedReason::NoJsonFound, "none", "plain prose");
        assert_eq!(failure.raw_content(), Some("plain prose"));
        assert_eq!(TaskFailure::MissingTitle.raw_content(), None);
    }

    #[test]
    fn test_display_includes_detail() {
        let failure = TaskFailure::malformed(MalformedReason::JsonDecode, "trailing comma", "{,}");
        assert_eq!(failure.to_string(), "JSON Decode Error: trailing comma");
    }

    #[test]
    fn test_default_sampling_params() {
        let params = SamplingParams::default();
        assert_eq!(params.temperature, 0.1);
        assert_eq!(params.top_p, 0.9);
    }
}
