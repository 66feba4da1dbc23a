//! Provider seam and registry
//!
//! A provider supplies only what differs between LLM vendors. The registry
//! maps configured provider names to implementations and carries the default
//! endpoint and model for each.

use crate::anthropic::AnthropicProvider;
use crate::chat_completions::ChatCompletionsProvider;
use crate::client::{ClientSettings, HttpLlmClient};
use crate::LlmError;
use litminer_domain::{EventSender, SamplingParams};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use serde_json::Value;

/// The per-provider pieces of an LLM API call
pub trait ChatProvider: Send + Sync + std::fmt::Debug {
    /// Provider name used in log lines
    fn name(&self) -> &str;

    /// Authentication (and version) headers for `credential`
    fn auth_headers(&self, credential: &str) -> Result<HeaderMap, InvalidHeaderValue>;

    /// Request body for one analysis call
    fn build_payload(&self, model: &str, prompt: &str, params: &SamplingParams) -> Value;

    /// The assistant's answer text inside the response envelope
    fn extract_answer(&self, envelope: &Value) -> Option<String>;
}

/// `Authorization: Bearer <credential>`
pub(crate) fn bearer_headers(credential: &str) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    let mut value = HeaderValue::from_str(&format!("Bearer {}", credential))?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Registry entry for a supported provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    /// Canonical name
    pub name: &'static str,
    /// Other accepted spellings
    pub aliases: &'static [&'static str],
    /// Default API endpoint
    pub default_endpoint: &'static str,
    /// Default model
    pub default_model: &'static str,
    /// Known models
    pub models: &'static [&'static str],
}

const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "openai",
        aliases: &["gpt"],
        default_endpoint: "https://api.openai.com/v1/chat/completions",
        default_model: "gpt-4o",
        models: &["gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"],
    },
    ProviderSpec {
        name: "anthropic",
        aliases: &["claude"],
        default_endpoint: "https://api.anthropic.com/v1/messages",
        default_model: "claude-3-sonnet-20240229",
        models: &[
            "claude-3-opus-20240229",
            "claude-3-sonnet-20240229",
            "claude-3-haiku-20240307",
        ],
    },
    ProviderSpec {
        name: "deepseek",
        aliases: &[],
        default_endpoint: "https://api.deepseek.com/chat/completions",
        default_model: "deepseek-chat",
        models: &["deepseek-chat"],
    },
    ProviderSpec {
        name: "moonshot",
        aliases: &["kimi"],
        default_endpoint: "https://api.moonshot.cn/v1/chat/completions",
        default_model: "moonshot-v1-8k",
        models: &["moonshot-v1-8k", "moonshot-v1-32k", "moonshot-v1-128k"],
    },
    ProviderSpec {
        name: "intern-ai",
        aliases: &["intern", "internai", "intern-ai (internal)"],
        default_endpoint: "https://chat.intern-ai.org.cn/api/v1/chat/completions",
        default_model: "intern-s1",
        models: &["intern-s1"],
    },
];

/// Every provider the registry knows about
pub fn supported_providers() -> &'static [ProviderSpec] {
    PROVIDERS
}

/// Look up a provider's registry entry (case-insensitive, aliases accepted)
pub fn provider_spec(name: &str) -> Option<&'static ProviderSpec> {
    let wanted = name.trim().to_lowercase();
    PROVIDERS
        .iter()
        .find(|spec| spec.name == wanted || spec.aliases.contains(&wanted.as_str()))
}

/// Instantiate the provider implementation for `name`
pub fn provider_by_name(name: &str) -> Result<Box<dyn ChatProvider>, LlmError> {
    let spec = provider_spec(name).ok_or_else(|| LlmError::UnknownProvider(name.to_string()))?;
    let provider: Box<dyn ChatProvider> = match spec.name {
        "openai" => Box::new(ChatCompletionsProvider::openai()),
        "anthropic" => Box::new(AnthropicProvider::new()),
        "deepseek" => Box::new(ChatCompletionsProvider::deepseek()),
        "moonshot" => Box::new(ChatCompletionsProvider::moonshot()),
        "intern-ai" => Box::new(ChatCompletionsProvider::intern_ai()),
        other => return Err(LlmError::UnknownProvider(other.to_string())),
    };
    Ok(provider)
}

/// Build an HTTP client for a named provider
///
/// # Errors
///
/// - [`LlmError::UnknownProvider`] if `name` is not registered
/// - [`LlmError::Configuration`] if the credential is missing
pub fn build_client(
    name: &str,
    settings: ClientSettings,
    events: EventSender,
) -> Result<HttpLlmClient, LlmError> {
    let provider = provider_by_name(name)?;
    HttpLlmClient::new(provider, settings, events)
}
