//! Litminer LLM Provider Layer
//!
//! Implementations of the [`LlmClient`](litminer_domain::LlmClient) capability.
//!
//! # Architecture
//!
//! Provider-specific code is confined to three pieces, captured by the
//! [`ChatProvider`] trait: the authentication headers, the request payload,
//! and where the answer text sits in the response envelope. Everything else
//! (retries with exponential backoff, per-request timeouts, cleaning the
//! answer into JSON) is shared by [`HttpLlmClient`], which owns a boxed
//! provider.
//!
//! # Providers
//!
//! - OpenAI, DeepSeek, Moonshot, Intern-AI: chat-completions shaped APIs
//! - Anthropic: messages API with a separate system prompt
//! - [`MockClient`]: deterministic client for tests, no network
//!
//! # Examples
//!
//! ```
//! use litminer_llm::MockClient;
//! use litminer_domain::{LlmClient, SamplingParams};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = MockClient::new(r#"{"material": "MAPbI3"}"#);
//!     let fields = client
//!         .analyze_text("any prompt", SamplingParams::default())
//!         .await
//!         .unwrap();
//!     assert_eq!(fields["material"], "MAPbI3");
//! }
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod chat_completions;
pub mod cleaning;
pub mod client;
pub mod mock;
pub mod provider;

use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use chat_completions::ChatCompletionsProvider;
pub use cleaning::{clean_json_response, find_json_span};
pub use client::{ClientSettings, HttpLlmClient, RetryPolicy};
pub use mock::{MockClient, MockReply};
pub use provider::{build_client, provider_by_name, provider_spec, supported_providers, ChatProvider, ProviderSpec};

/// Errors raised while constructing an LLM client
///
/// Per-request failures are not errors at this level; they are reported as
/// [`TaskFailure`](litminer_domain::TaskFailure) values from `analyze_text`.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Missing or unusable credential, endpoint or model
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider name not in the registry
    #[error("Unknown API provider: {0}")]
    UnknownProvider(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
