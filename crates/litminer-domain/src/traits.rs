//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and
//! infrastructure. Implementations live in other crates.

use crate::result::{AnalysisResult, SamplingParams};
use async_trait::async_trait;

/// The "analyze text → structured result" capability
///
/// Implemented by the infrastructure layer (litminer-llm). Implementations
/// own their retry, backoff and response-cleaning behavior and always return
/// an [`AnalysisResult`]: transport failures and unparseable answers come
/// back as tagged failures, never as panics.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` to the model and parse its answer into fields
    async fn analyze_text(&self, prompt: &str, params: SamplingParams) -> AnalysisResult;

    /// Human-readable backend name for log lines
    fn describe(&self) -> String;
}
