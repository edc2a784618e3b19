//! Ollama provider implementation
//!
//! Runs models locally through Ollama's OpenAI-compatible endpoint.

use async_trait::async_trait;

use crate::openai::OpenAI;
use crate::{ChatRequest, Provider, Result, StreamingResponse};

/// Default local endpoint
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Ollama API client (OpenAI compatible)
pub struct Ollama {
    inner: OpenAI,
}

impl Ollama {
    /// Create with custom Ollama server URL
    ///
    /// # Example
    /// ```no_run
    /// use temper_providers::ollama::Ollama;
    ///
    /// let ollama = Ollama::new("http://192.168.1.100:11434/v1").unwrap();
    /// ```
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // Ollama ignores the key but the header must be well-formed
        let inner = OpenAI::with_base_url("ollama", base_url)?.named("ollama");
        Ok(Self { inner })
    }

    /// Use `OLLAMA_BASE_URL`, or the default local server
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        self.inner.stream_completion(request).await
    }

    fn name(&self) -> &'static str {
        "ollama"
    }

    fn supports_json_mode(&self) -> bool {
        true
    }
}

/// Llama 3.1 8B
pub const LLAMA_3_1_8B: &str = "llama3.1:8b";
/// Qwen 2.5 7B
pub const QWEN_2_5_7B: &str = "qwen2.5:7b";
/// Mistral 7B
pub const MISTRAL_7B: &str = "mistral:7b";
