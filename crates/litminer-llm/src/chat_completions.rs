//! Chat-completions shaped providers
//!
//! OpenAI, DeepSeek, Moonshot and Intern-AI share one wire format: bearer
//! authentication, a `messages` array, and the answer at
//! `choices[0].message.content`. They differ only in a few optional body
//! fields, which are toggled per provider here.

use crate::provider::{bearer_headers, ChatProvider};
use litminer_domain::SamplingParams;
use reqwest::header::{HeaderMap, InvalidHeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chat-completions provider
#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
    name: &'static str,
    json_mode: bool,
    intern_extras: bool,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Request body for the chat-completions API
#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_mode: Option<bool>,
}

/// Response envelope from the chat-completions API
#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

impl ChatCompletionsProvider {
    /// OpenAI with JSON-object response mode
    pub fn openai() -> Self {
        Self { name: "openai", json_mode: true, intern_extras: false }
    }

    /// DeepSeek, plain payload
    pub fn deepseek() -> Self {
        Self { name: "deepseek", json_mode: false, intern_extras: false }
    }

    /// Moonshot with JSON-object response mode
    pub fn moonshot() -> Self {
        Self { name: "moonshot", json_mode: true, intern_extras: false }
    }

    /// Intern-AI, single completion with thinking mode off
    pub fn intern_ai() -> Self {
        Self { name: "intern-ai", json_mode: false, intern_extras: true }
    }
}

impl ChatProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn auth_headers(&self, credential: &str) -> Result<HeaderMap, InvalidHeaderValue> {
        bearer_headers(credential)
    }

    fn build_payload(&self, model: &str, prompt: &str, params: &SamplingParams) -> Value {
        let request = ChatCompletionsRequest {
            model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: params.temperature,
            top_p: params.top_p,
            response_format: self.json_mode.then_some(ResponseFormat { kind: "json_object" }),
            n: self.intern_extras.then_some(1),
            thinking_mode: self.intern_extras.then_some(false),
        };
        serde_json::to_value(request).unwrap_or_default()
    }

    fn extract_answer(&self, envelope: &Value) -> Option<String> {
        let response = ChatCompletionsResponse::deserialize(envelope).ok()?;
        response.choices.into_iter().next()?.message.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openai_payload_requests_json_mode() {
        let payload = ChatCompletionsProvider::openai().build_payload(
            "gpt-4o",
            "analyze this",
            &SamplingParams::default(),
        );
        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"], "analyze this");
        assert_eq!(payload["temperature"], 0.1);
        assert_eq!(payload["top_p"], 0.9);
        assert_eq!(payload["response_format"]["type"], "json_object");
        assert!(payload.get("n").is_none());
    }

    #[test]
    fn test_deepseek_payload_is_plain() {
        let payload = ChatCompletionsProvider::deepseek().build_payload(
            "deepseek-chat",
            "p",
            &SamplingParams::default(),
        );
        assert!(payload.get("response_format").is_none());
        assert!(payload.get("thinking_mode").is_none());
    }

    #[test]
    fn test_intern_payload_extras() {
        let payload = ChatCompletionsProvider::intern_ai().build_payload(
            "intern-s1",
            "p",
            &SamplingParams::default(),
        );
        assert_eq!(payload["n"], 1);
        assert_eq!(payload["thinking_mode"], false);
        assert!(payload.get("response_format").is_none());
    }

    #[test]
    fn test_extract_answer() {
        let envelope = json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"x\":1}"}}]
        });
        let answer = ChatCompletionsProvider::openai().extract_answer(&envelope);
        assert_eq!(answer.as_deref(), Some("{\"x\":1}"));
    }

    #[test]
    fn test_extract_answer_unexpected_envelope() {
        let provider = ChatCompletionsProvider::moonshot();
        assert_eq!(provider.extract_answer(&json!({"error": {"message": "quota"}})), None);
        assert_eq!(provider.extract_answer(&json!({"choices": []})), None);
        assert_eq!(
            provider.extract_answer(&json!({"choices": [{"message": {"content": null}}]})),
            None
        );
    }
}
