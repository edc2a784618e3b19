//! Groq provider implementation
//!
//! Groq serves open models behind an OpenAI-compatible API with very low
//! latency, which keeps the two model calls per turn fast.

use async_trait::async_trait;

use crate::openai::OpenAI;
use crate::{ChatRequest, Error, Provider, Result, StreamingResponse};

/// Groq API client (OpenAI compatible)
pub struct Groq {
    inner: OpenAI,
}

impl Groq {
    /// Create from API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let inner = OpenAI::with_base_url(api_key, "https://api.groq.com/openai/v1")?.named("groq");
        Ok(Self { inner })
    }

    /// Create from environment variable GROQ_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| Error::ProviderAuth("GROQ_API_KEY not set".to_string()))?;
        Self::new(api_key)
    }
}

#[async_trait]
impl Provider for Groq {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        self.inner.stream_completion(request).await
    }

    fn name(&self) -> &'static str {
        "groq"
    }

    fn supports_json_mode(&self) -> bool {
        true
    }
}

/// Llama 3.3 70B
pub const LLAMA_3_3_70B: &str = "llama-3.3-70b-versatile";
/// Llama 3.1 8B, good enough for classification
pub const LLAMA_3_1_8B: &str = "llama-3.1-8b-instant";
