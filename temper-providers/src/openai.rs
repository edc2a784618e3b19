//! OpenAI provider implementation
//!
//! Also compatible with OpenAI-compatible APIs like Groq, Mistral, etc.

use async_trait::async_trait;
use futures::{future, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::utils::{check_response, sse_data_stream};
use crate::{ChatRequest, Error, HttpConfig, Message, Provider, Result, StreamingChoice, StreamingResponse};

/// OpenAI API client
pub struct OpenAI {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    name: &'static str,
}

impl OpenAI {
    /// Create from API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, "https://api.openai.com/v1")
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::ProviderAuth("OPENAI_API_KEY not set".to_string()))?;
        Self::new(api_key)
    }

    /// Create with custom base URL (for compatible APIs)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, base_url, &HttpConfig::default())
    }

    /// Create with custom base URL and HTTP settings
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        config: &HttpConfig,
    ) -> Result<Self> {
        Ok(Self {
            client: config.build_client()?,
            api_key: api_key.into(),
            base_url: base_url.into(),
            name: "openai",
        })
    }

    /// Create for Mistral
    pub fn mistral(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, "https://api.mistral.ai/v1").map(|p| p.named("mistral"))
    }

    /// Rename for logging and error messages when pointed at a compatible API
    pub(crate) fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Internal(e.to_string()))?,
        );
        Ok(headers)
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

/// Streaming chunk from OpenAI
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    /// Reasoning text from compatible servers that expose it
    reasoning_content: Option<String>,
}

impl OpenAI {
    fn convert_messages(system_prompt: Option<String>, messages: Vec<Message>) -> Vec<WireMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);
        if let Some(prompt) = system_prompt {
            result.push(WireMessage {
                role: "system",
                content: prompt,
            });
        }
        result.extend(messages.into_iter().map(|msg| WireMessage {
            role: msg.role.as_str(),
            content: msg.content,
        }));
        result
    }

    fn build_request(request: ChatRequest) -> WireRequest {
        let ChatRequest {
            model,
            system_prompt,
            messages,
            temperature,
            max_tokens,
            extra_params,
        } = request;

        let response_format = extra_params
            .as_ref()
            .and_then(|params| params.get("response_format"))
            .cloned();

        WireRequest {
            model,
            messages: Self::convert_messages(system_prompt, messages),
            temperature,
            max_tokens,
            response_format,
            stream: true,
        }
    }
}

/// Turn one SSE payload into a streaming chunk; `None` skips it
fn parse_chunk(payload: Result<String>) -> Option<Result<StreamingChoice>> {
    let data = match payload {
        Ok(data) => data,
        Err(e) => return Some(Err(e)),
    };
    if data.trim() == "[DONE]" {
        return Some(Ok(StreamingChoice::Done));
    }

    match serde_json::from_str::<StreamChunk>(&data) {
        Ok(chunk) => {
            let delta = chunk.choices.into_iter().next()?.delta;
            if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
                return Some(Ok(StreamingChoice::Message(text)));
            }
            delta
                .reasoning_content
                .filter(|t| !t.is_empty())
                .map(|t| Ok(StreamingChoice::Thought(t)))
        }
        Err(e) => {
            tracing::warn!("Failed to parse SSE chunk: {}", e);
            None
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        let body = Self::build_request(request);
        tracing::debug!(provider = self.name, model = %body.model, messages = body.messages.len(), "Sending chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await?;
        let response = check_response(self.name, response).await?;

        let stream = sse_data_stream(response.bytes_stream())
            .filter_map(|payload| future::ready(parse_chunk(payload)));
        Ok(StreamingResponse::from_stream(stream))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn supports_json_mode(&self) -> bool {
        true
    }
}

/// Common model constants
pub const GPT_4O: &str = "gpt-4o";
/// Small, fast default for persona replies
pub const GPT_4O_MINI: &str = "gpt-4o-mini";
/// GPT-4.1 mini
pub const GPT_4_1_MINI: &str = "gpt-4.1-mini";
