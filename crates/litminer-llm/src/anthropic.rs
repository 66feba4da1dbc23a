//! Anthropic messages API
//!
//! The messages API takes the system prompt as a separate field. Prompt
//! templates mark where instructions end with [`TEXT_MARKER`]; everything
//! before it becomes the system prompt.

use crate::provider::ChatProvider;
use litminer_domain::SamplingParams;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between instructions and the text to analyze
pub const TEXT_MARKER: &str = "--- TEXT TO ANALYZE ---";

/// API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Completion length requested from the model
pub const MAX_TOKENS: u32 = 4096;

/// The Anthropic provider
#[derive(Debug, Clone, Default)]
pub struct AnthropicProvider;

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Request body for the messages API
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    temperature: f64,
    top_p: f64,
}

/// Response envelope from the messages API
#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl AnthropicProvider {
    /// Create the provider
    pub fn new() -> Self {
        Self
    }
}

/// Split a prompt into `(system, user)` at the text marker
///
/// Without the marker the whole prompt is the user message.
pub fn split_system_prompt(prompt: &str) -> (Option<&str>, &str) {
    match prompt.find(TEXT_MARKER) {
        Some(index) => {
            let system = prompt[..index].trim();
            let system = (!system.is_empty()).then_some(system);
            (system, &prompt[index..])
        }
        None => (None, prompt),
    }
}

impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn auth_headers(&self, credential: &str) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(credential)?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-api-key"), key);
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        Ok(headers)
    }

    fn build_payload(&self, model: &str, prompt: &str, params: &SamplingParams) -> Value {
        let (system, user) = split_system_prompt(prompt);
        let request = MessagesRequest {
            model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![Message { role: "user", content: user }],
            temperature: params.temperature,
            top_p: params.top_p,
        };
        serde_json::to_value(request).unwrap_or_default()
    }

    fn extract_answer(&self, envelope: &Value) -> Option<String> {
        let response = MessagesResponse::deserialize(envelope).ok()?;
        response.content.into_iter().next()?.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_at_marker() {
        let prompt = "You are a materials scientist.\n\n--- TEXT TO ANALYZE ---\nTitle: X";
        let (system, user) = split_system_prompt(prompt);
        assert_eq!(system, Some("You are a materials scientist."));
        assert_eq!(user, "--- TEXT TO ANALYZE ---\nTitle: X");
    }

    #[test]
    fn test_no_marker_means_no_system() {
        let (system, user) = split_system_prompt("Extract fields from: Title: X");
        assert_eq!(system, None);
        assert_eq!(user, "Extract fields from: Title: X");
    }

    #[test]
    fn test_payload_shape() {
        let prompt = "Instructions\n--- TEXT TO ANALYZE ---\nbody";
        let payload = AnthropicProvider::new().build_payload(
            "claude-3-sonnet-20240229",
            prompt,
            &SamplingParams::default(),
        );
        assert_eq!(payload["max_tokens"], 4096);
        assert_eq!(payload["system"], "Instructions");
        assert_eq!(payload["messages"][0]["content"], "--- TEXT TO ANALYZE ---\nbody");
        assert_eq!(payload["temperature"], 0.1);
    }

    #[test]
    fn test_payload_without_system_omits_field() {
        let payload =
            AnthropicProvider::new().build_payload("m", "just text", &SamplingParams::default());
        assert!(payload.get("system").is_none());
    }

    #[test]
    fn test_headers() {
        let headers = AnthropicProvider::new().auth_headers("sk-ant").unwrap();
        assert_eq!(headers.get("x-api-key").unwrap().to_str().unwrap(), "sk-ant");
        assert_eq!(headers.get("anthropic-version").unwrap().to_str().unwrap(), ANTHROPIC_VERSION);
        assert!(headers.get("authorization").is_none());
    }

    #[test]
    fn test_extract_answer() {
        let envelope = json!({"content": [{"type": "text", "text": "{\"ok\": true}"}]});
        assert_eq!(
            AnthropicProvider::new().extract_answer(&envelope).as_deref(),
            Some("{\"ok\": true}")
        );
        assert_eq!(AnthropicProvider::new().extract_answer(&json!({"content": []})), None);
    }
}
