//! HTTP client shared by every provider
//!
//! [`HttpLlmClient`] owns the parts of an LLM call that do not depend on the
//! vendor: a bounded retry loop with exponential backoff, the per-request
//! timeout, and cleaning the answer into JSON.

use crate::cleaning::clean_json_response;
use crate::provider::ChatProvider;
use crate::LlmError;
use async_trait::async_trait;
use litminer_domain::{AnalysisResult, EventSender, LlmClient, MalformedReason, SamplingParams, TaskFailure};
use serde_json::Value;
use std::time::Duration;

/// Default number of attempts per record
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request timeout (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Bounded retries with exponential backoff
///
/// After failed attempt `k` (1-based) the client waits `backoff_unit * 2^k`
/// before the next attempt. No wait follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    /// Backoff base
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_retries: u32, backoff_unit: Duration) -> Self {
        Self { max_retries, backoff_unit }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Worst-case time spent sleeping across all attempts
    pub fn total_backoff(&self) -> Duration {
        (1..self.attempts())
            .map(|attempt| self.delay_for_attempt(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Connection settings for one provider
#[derive(Clone)]
pub struct ClientSettings {
    /// API key
    pub credential: String,
    /// Model identifier
    pub model: String,
    /// Full endpoint URL
    pub endpoint: String,
    /// Retry behavior
    pub retry: RetryPolicy,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("credential", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientSettings {
    /// Settings with default retry policy and timeout
    pub fn new(
        credential: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            credential: credential.into(),
            model: model.into(),
            endpoint: endpoint.into(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// [`LlmClient`] over HTTP for any [`ChatProvider`]
#[derive(Debug)]
pub struct HttpLlmClient {
    provider: Box<dyn ChatProvider>,
    model: String,
    endpoint: String,
    retry: RetryPolicy,
    http: reqwest::Client,
    events: EventSender,
}

impl HttpLlmClient {
    /// Create a client
    ///
    /// Authentication headers are built here so a bad credential fails at
    /// startup instead of on every record.
    ///
    /// # Errors
    ///
    /// - [`LlmError::Configuration`] for an empty credential, model or
    ///   endpoint, or a credential that is not a valid header value
    /// - [`LlmError::Http`] if the underlying HTTP client cannot be built
    pub fn new(
        provider: Box<dyn ChatProvider>,
        settings: ClientSettings,
        events: EventSender,
    ) -> Result<Self, LlmError> {
        if settings.credential.trim().is_empty() {
            return Err(LlmError::Configuration(format!(
                "API key is required for provider '{}'",
                provider.name()
            )));
        }
        if settings.endpoint.trim().is_empty() {
            return Err(LlmError::Configuration(format!(
                "endpoint is required for provider '{}'",
                provider.name()
            )));
        }
        if settings.model.trim().is_empty() {
            return Err(LlmError::Configuration(format!(
                "model is required for provider '{}'",
                provider.name()
            )));
        }

        let headers = provider
            .auth_headers(settings.credential.trim())
            .map_err(|e| LlmError::Configuration(format!("invalid API key: {}", e)))?;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            provider,
            model: settings.model,
            endpoint: settings.endpoint,
            retry: settings.retry,
            http,
            events,
        })
    }

    /// The retry policy in effect
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn send_once(&self, payload: &Value) -> Result<Value, String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        let status = response.status();
        tracing::trace!(provider = self.provider.name(), %status, "Response received");
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("HTTP {}: {}", status, body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn analyze_text(&self, prompt: &str, params: SamplingParams) -> AnalysisResult {
        let payload = self.provider.build_payload(&self.model, prompt, &params);
        let attempts = self.retry.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            self.events.debug(format!(
                "Sending request to {} (attempt {}/{})",
                self.provider.name(),
                attempt,
                attempts
            ));

            match self.send_once(&payload).await {
                Ok(envelope) => {
                    return match self.provider.extract_answer(&envelope) {
                        Some(answer) => clean_json_response(&answer, &self.events),
                        None => {
                            self.events.error(format!(
                                "Unexpected API response format from {}",
                                self.provider.name()
                            ));
                            Err(TaskFailure::malformed(
                                MalformedReason::UnexpectedEnvelope,
                                "answer not found in response envelope",
                                envelope.to_string(),
                            ))
                        }
                    };
                }
                Err(e) => {
                    self.events.warn(format!(
                        "API request failed (attempt {}/{}): {}",
                        attempt, attempts, e
                    ));
                    last_error = e;
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
            }
        }

        self.events.error(format!(
            "API request failed after {} attempts: {}",
            attempts, last_error
        ));
        Err(TaskFailure::ExhaustedRetries { attempts, last_error })
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.provider.name(), self.model)
    }
}
