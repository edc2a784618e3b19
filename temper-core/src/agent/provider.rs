//! Provider trait for LLM integrations

use async_trait::async_trait;

use crate::agent::message::Message;
use crate::agent::streaming::StreamingResponse;
use crate::error::Result;

mod resilient;

pub use resilient::{CircuitBreakerConfig, ResilientProvider};

/// Request for a chat completion
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Model name to use
    pub model: String,
    /// Optional system prompt, sent ahead of any system messages in `messages`
    pub system_prompt: Option<String>,
    /// Conversation, possibly containing system messages
    pub messages: Vec<Message>,
    /// Optional temperature setting
    pub temperature: Option<f64>,
    /// Optional max tokens
    pub max_tokens: Option<u64>,
    /// Optional provider-specific parameters (e.g. `response_format`)
    pub extra_params: Option<serde_json::Value>,
}

/// Trait for LLM providers
///
/// Implement this trait to add support for a new LLM backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stream a completion request
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse>;

    /// Get provider name (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Check if provider honours `response_format: json_object`
    fn supports_json_mode(&self) -> bool {
        false
    }
}
