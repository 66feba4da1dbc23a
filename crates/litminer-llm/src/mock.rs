//! Mock LLM client for testing
//!
//! Returns canned answers without touching the network. Answers are chosen
//! by substring match against the prompt, so a test can steer individual
//! records by title. Text answers go through the same JSON cleaning as the
//! HTTP client.

use crate::cleaning::clean_json_response;
use async_trait::async_trait;
use litminer_domain::{AnalysisResult, EventSender, LlmClient, SamplingParams, TaskFailure};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A canned reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Raw answer text, cleaned into JSON like a real response
    Text(String),
    /// A failure returned as-is
    Failure(TaskFailure),
    /// Panic inside the call
    Panic(String),
}

/// Deterministic [`LlmClient`] for tests
#[derive(Debug)]
pub struct MockClient {
    default_reply: MockReply,
    rules: Vec<(String, MockReply)>,
    latency: Option<Duration>,
    events: EventSender,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockClient {
    /// Create a mock that answers every prompt with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_reply: MockReply::Text(response.into()),
            rules: Vec::new(),
            latency: None,
            events: EventSender::detached(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `reply` when the prompt contains `needle`
    ///
    /// Rules are checked in insertion order; the first match wins.
    pub fn with_reply(mut self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Sleep this long inside every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Route cleaning warnings to `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reply_for(&self, prompt: &str) -> &MockReply {
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default_reply)
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn analyze_text(&self, prompt: &str, _params: SamplingParams) -> AnalysisResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.reply_for(prompt) {
            MockReply::Text(text) => clean_json_response(text, &self.events),
            MockReply::Failure(failure) => Err(failure.clone()),
            MockReply::Panic(message) => panic!("{}", message),
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_default_reply() {
        let client = MockClient::new(r#"{"a": 1}"#);
        let fields = client.analyze_text("x", SamplingParams::default()).await.unwrap();
        assert_eq!(fields["a"], 1);
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.prompts(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_rules_match_by_substring() {
        let client = MockClient::new(r#"{"a": 1}"#)
            .with_reply("Perovskite", MockReply::Text("no json here".into()))
            .with_reply(
                "Timeout",
                MockReply::Failure(TaskFailure::ExhaustedRetries {
                    attempts: 3,
                    last_error: "timed out".into(),
                }),
            );

        let malformed = client
            .analyze_text("Title: Perovskite cells", SamplingParams::default())
            .await
            .unwrap_err();
        assert_eq!(malformed.label(), "No JSON found in response");

        let exhausted = client
            .analyze_text("Title: Timeout study", SamplingParams::default())
            .await
            .unwrap_err();
        assert_eq!(exhausted.label(), "API Failure after retries");

        assert!(client.analyze_text("Title: other", SamplingParams::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_tracks_concurrency() {
        let client = Arc::new(MockClient::new("{}").with_latency(Duration::from_millis(30)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move { client.analyze_text("p", SamplingParams::default()).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(client.call_count(), 4);
        assert!(client.max_in_flight() >= 2);
        assert!(client.max_in_flight() <= 4);
    }

    #[tokio::test]
    async fn test_panic_reply_panics() {
        let client = Arc::new(MockClient::new("{}").with_reply("boom", MockReply::Panic("kaboom".into())));
        let task = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.analyze_text("boom", SamplingParams::default()).await })
        };
        let err = task.await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(client.max_in_flight(), 1);
    }
}
