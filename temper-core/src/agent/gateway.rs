//! Language-model gateway
//!
//! The single calling boundary between the emotion pipeline and whatever
//! [`Provider`] backs it. Enforces the request timeout, retries transient
//! failures and normalises provider errors into the typed gateway variants.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::agent::message::Message;
use crate::agent::provider::{ChatRequest, Provider};
use crate::error::{Error, Result};

/// Per-call generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model override; the gateway default is used when `None`
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: f64,
    /// Maximum tokens to generate
    pub max_tokens: u64,
    /// Ask the provider for a bare JSON object when it supports it
    pub json_mode: bool,
}

impl GenerationParams {
    /// Plain text generation with the given sampling settings
    pub fn new(temperature: f64, max_tokens: u64) -> Self {
        Self {
            model: None,
            temperature,
            max_tokens,
            json_mode: false,
        }
    }

    /// Request strict JSON output
    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Use a specific model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(0.7, 300)
    }
}

/// Gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Model used when a call does not override it
    pub default_model: String,
    /// Upper bound for one provider round trip, streaming included
    pub request_timeout_secs: u64,
    /// Extra attempts for transient failures
    pub max_retries: u32,
    /// Linear backoff step between transient retries
    pub retry_backoff_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// Calls a provider and returns the generated text
#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn Provider>,
    config: GatewayConfig,
}

impl Gateway {
    /// Create a gateway over a shared provider
    pub fn new(provider: Arc<dyn Provider>, config: GatewayConfig) -> Self {
        Self { provider, config }
    }

    /// Create a gateway with the default configuration
    pub fn with_provider<P: Provider + 'static>(provider: P) -> Self {
        Self::new(Arc::new(provider), GatewayConfig::default())
    }

    /// Name of the backing provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Gateway configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Send `messages` and return the full reply text
    ///
    /// Transient failures are retried up to `max_retries` times. Rate limits and
    /// content rejections are returned immediately.
    #[instrument(skip(self, messages, params), fields(provider = self.provider.name(), message_count = messages.len()))]
    pub async fn call(&self, messages: Vec<Message>, params: &GenerationParams) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.call_once(messages.clone(), params).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt <= self.config.max_retries => {
                    let delay = Duration::from_millis(self.config.retry_backoff_ms * u64::from(attempt));
                    warn!(attempt, error = %e, "Transient gateway failure, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once(&self, messages: Vec<Message>, params: &GenerationParams) -> Result<String> {
        let extra_params = if params.json_mode && self.provider.supports_json_mode() {
            Some(serde_json::json!({ "response_format": { "type": "json_object" } }))
        } else {
            None
        };

        let request = ChatRequest {
            model: params
                .model
                .clone()
                .unwrap_or_else(|| self.config.default_model.clone()),
            system_prompt: None,
            messages,
            temperature: Some(params.temperature),
            max_tokens: Some(params.max_tokens),
            extra_params,
        };

        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let completion = async {
            let stream = self.provider.stream_completion(request).await?;
            stream.collect().await
        };

        let completion = match tokio::time::timeout(timeout, completion).await {
            Ok(result) => result.map_err(classify_error)?,
            Err(_) => {
                return Err(Error::GatewayTimeout {
                    timeout_secs: self.config.request_timeout_secs,
                })
            }
        };

        if !completion.thought.is_empty() {
            debug!(thought = %completion.thought, "Model reasoning");
        }
        let text = completion.text;

        if text.trim().is_empty() {
            return Err(Error::StreamInterrupted(format!(
                "{} returned an empty completion",
                self.provider.name()
            )));
        }

        debug!(chars = text.len(), "Gateway call completed");
        Ok(text)
    }
}

/// Map loosely-typed provider failures onto the gateway taxonomy
///
/// Providers already emit typed errors for the status codes they understand;
/// this catches the remaining cases where only the message body tells.
pub fn classify_error(error: Error) -> Error {
    match error {
        Error::ProviderApi(msg) => {
            let lower = msg.to_lowercase();
            if lower.contains("content_filter")
                || lower.contains("content policy")
                || lower.contains("content_policy")
                || lower.contains("safety")
            {
                Error::ContentRejected(msg)
            } else if lower.contains("api error 429") || lower.contains("rate limit") {
                Error::ProviderRateLimit { retry_after_secs: 0 }
            } else {
                Error::ProviderApi(msg)
            }
        }
        other => other,
    }
}
