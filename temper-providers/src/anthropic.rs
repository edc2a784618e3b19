//! Anthropic (Claude) provider implementation

use async_trait::async_trait;
use futures::{future, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::utils::{check_response, sse_data_stream};
use crate::{
    ChatRequest, Error, HttpConfig, Message, Provider, Result, Role, StreamingChoice,
    StreamingResponse,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The messages API requires an explicit budget
const DEFAULT_MAX_TOKENS: u64 = 1024;

/// Anthropic API client
pub struct Anthropic {
    client: reqwest::Client,
    api_key: String,
}

impl Anthropic {
    /// Create from API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, &HttpConfig::default())
    }

    /// Create with custom HTTP settings
    pub fn with_config(api_key: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: config.build_client()?,
            api_key: api_key.into(),
        })
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| Error::ProviderAuth("ANTHROPIC_API_KEY not set".to_string()))?;
        Self::new(api_key)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|e| Error::Internal(e.to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        Ok(headers)
    }
}

/// Anthropic chat request
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

/// Streaming event from Anthropic
#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<StreamDelta>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    text: Option<String>,
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl Anthropic {
    /// Split out system text; the API takes it as a top-level field
    fn convert_messages(
        system_prompt: Option<String>,
        messages: Vec<Message>,
    ) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts: Vec<String> = system_prompt.into_iter().collect();
        let mut converted = Vec::with_capacity(messages.len());

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(msg.content),
                Role::User => converted.push(AnthropicMessage {
                    role: "user",
                    content: msg.content,
                }),
                Role::Assistant => converted.push(AnthropicMessage {
                    role: "assistant",
                    content: msg.content,
                }),
            }
        }

        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
        (system, converted)
    }
}

fn parse_event(payload: Result<String>) -> Option<Result<StreamingChoice>> {
    let data = match payload {
        Ok(data) => data,
        Err(e) => return Some(Err(e)),
    };

    let event = match serde_json::from_str::<StreamEvent>(&data) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("Failed to parse Anthropic event: {}", e);
            return None;
        }
    };

    match event.event_type.as_str() {
        "content_block_delta" => {
            let delta = event.delta?;
            if let Some(text) = delta.text.filter(|t| !t.is_empty()) {
                return Some(Ok(StreamingChoice::Message(text)));
            }
            delta
                .thinking
                .filter(|t| !t.is_empty())
                .map(|t| Ok(StreamingChoice::Thought(t)))
        }
        "message_stop" => Some(Ok(StreamingChoice::Done)),
        "error" => {
            let err = event.error?;
            Some(Err(match err.error_type.as_str() {
                "rate_limit_error" | "overloaded_error" => Error::ProviderRateLimit { retry_after_secs: 0 },
                _ => Error::StreamInterrupted(format!("anthropic {}: {}", err.error_type, err.message)),
            }))
        }
        _ => None,
    }
}

#[async_trait]
impl Provider for Anthropic {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        let ChatRequest {
            model,
            system_prompt,
            messages,
            temperature,
            max_tokens,
            extra_params: _,
        } = request;

        let (system, messages) = Self::convert_messages(system_prompt, messages);
        let body = AnthropicRequest {
            model,
            messages,
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            temperature,
            stream: true,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await?;
        let response = check_response("anthropic", response).await?;

        let stream = sse_data_stream(response.bytes_stream())
            .filter_map(|payload| future::ready(parse_event(payload)));
        Ok(StreamingResponse::from_stream(stream))
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Claude Sonnet 4
pub const CLAUDE_SONNET_4: &str = "claude-sonnet-4-20250514";
/// Claude 3.5 Haiku
pub const CLAUDE_3_5_HAIKU: &str = "claude-3-5-haiku-20241022";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_messages_collected() {
        let messages = vec![
            Message::user("Hello"),
            Message::assistant("Hi!"),
            Message::user("How are you?"),
            Message::system("Use <t> tags"),
        ];

        let (system, converted) =
            Anthropic::convert_messages(Some("You are Rex".to_string()), messages);
        assert_eq!(system.as_deref(), Some("You are Rex\n\nUse <t> tags"));
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "user");
        assert_eq!(converted[1].role, "assistant");
    }

    #[test]
    fn test_no_system() {
        let (system, _) = Anthropic::convert_messages(None, vec![Message::user("x")]);
        assert!(system.is_none());
    }

    #[test]
    fn test_parse_events() {
        let text = parse_event(Ok(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"GRR"}}"#.to_string(),
        ));
        assert!(matches!(text, Some(Ok(StreamingChoice::Message(t))) if t == "GRR"));

        let thought = parse_event(Ok(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"calm"}}"#.to_string(),
        ));
        assert!(matches!(thought, Some(Ok(StreamingChoice::Thought(_)))));

        assert!(matches!(
            parse_event(Ok(r#"{"type":"message_stop"}"#.to_string())),
            Some(Ok(StreamingChoice::Done))
        ));
        assert!(parse_event(Ok(r#"{"type":"ping"}"#.to_string())).is_none());

        let overloaded = parse_event(Ok(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#.to_string(),
        ));
        assert!(matches!(overloaded, Some(Err(Error::ProviderRateLimit { .. }))));
    }
}
