//! Mock provider for testing
//!
//! Replies are scripted in order; once the script runs out the default reply
//! is repeated. Every request is recorded for inspection.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use temper_core::agent::streaming::MockStreamBuilder;

use crate::{ChatRequest, Error, Provider, Result, StreamingResponse};

/// A mock provider for testing
pub struct MockProvider {
    default_response: String,
    script: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    json_mode: bool,
}

impl MockProvider {
    /// Create a new mock provider with predefined response
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            json_mode: false,
        }
    }

    /// Queue a reply
    pub fn push_response(&self, response: impl Into<String>) -> &Self {
        self.script.lock().push_back(Ok(response.into()));
        self
    }

    /// Queue a failure
    pub fn push_error(&self, error: Error) -> &Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Claim support for `response_format: json_object`
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        self.requests.lock().push(request);

        let next = self.script.lock().pop_front();
        let response = match next {
            Some(scripted) => scripted?,
            None => self.default_response.clone(),
        };

        // Split response into chunks for realistic streaming simulation
        let chars: Vec<char> = response.chars().collect();
        let builder = chars
            .chunks(10)
            .fold(MockStreamBuilder::new(), |b, chunk| {
                b.message(chunk.iter().collect::<String>())
            });

        Ok(builder.done().build())
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn supports_json_mode(&self) -> bool {
        self.json_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    fn request(text: &str) -> ChatRequest {
        ChatRequest {
            model: "test".to_string(),
            messages: vec![Message::user(text)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockProvider::new("Hello, world! This is a longer reply.");
        let stream = provider.stream_completion(request("Hi")).await.unwrap();
        let text = stream.collect_text().await.unwrap();
        assert_eq!(text, "Hello, world! This is a longer reply.");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.requests()[0].messages[0].content, "Hi");
    }

    #[tokio::test]
    async fn test_script_then_default() {
        let provider = MockProvider::new("default");
        provider
            .push_response("first")
            .push_error(Error::ProviderRateLimit { retry_after_secs: 1 });

        let first = provider.stream_completion(request("a")).await.unwrap();
        assert_eq!(first.collect_text().await.unwrap(), "first");

        let second = provider.stream_completion(request("b")).await;
        assert!(matches!(second, Err(Error::ProviderRateLimit { .. })));

        let third = provider.stream_completion(request("c")).await.unwrap();
        assert_eq!(third.collect_text().await.unwrap(), "default");
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_json_mode_flag() -> anyhow::Result<()> {
        let provider = MockProvider::new(r#"{"emotion": "joy", "intensity": 0.9}"#).with_json_mode(true);
        assert!(provider.supports_json_mode());

        let text = tokio_test::block_on(async {
            provider.stream_completion(request("classify")).await?.collect_text().await
        })?;
        assert!(text.starts_with("{\"emotion\""));
        Ok(())
    }
}
