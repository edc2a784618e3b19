//! Error types for the temper core

use thiserror::Error;

/// Result type alias using temper's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the temper core
#[derive(Debug, Error)]
pub enum Error {
    // ============ Gateway / Provider Errors ============
    /// Provider API error that does not fit a more specific category
    #[error("Provider API error: {0}")]
    ProviderApi(String),

    /// Provider authentication failed
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider rate limit exceeded
    #[error("Provider rate limit exceeded: retry after {retry_after_secs}s")]
    ProviderRateLimit {
        /// Seconds to wait before retrying
        retry_after_secs: u64,
    },

    /// The provider refused the request on content-safety grounds
    #[error("Content rejected by provider: {0}")]
    ContentRejected(String),

    /// The gateway gave up waiting for the provider
    #[error("Gateway timeout after {timeout_secs}s")]
    GatewayTimeout {
        /// Timeout duration in seconds
        timeout_secs: u64,
    },

    /// Stream interrupted
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    // ============ Prompt Errors ============
    /// A named prompt block is not available
    #[error("Prompt not found: {name} ({locale})")]
    PromptNotFound {
        /// Block name
        name: String,
        /// Requested locale
        locale: String,
    },

    // ============ Emotion Pipeline Errors ============
    /// Configuration could not be loaded or is invalid
    #[error("Config load error: {0}")]
    ConfigLoad(String),

    /// The classifier output could not be turned into a judgment
    #[error("Classification error: {0}")]
    Classification(String),

    // ============ Message Errors ============
    /// Message serialization failed
    #[error("Message serialization error: {0}")]
    MessageSerialize(#[from] serde_json::Error),

    // ============ Network Errors ============
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ============ System Errors ============
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============ Generic Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a new prompt-not-found error
    pub fn prompt_not_found(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self::PromptNotFound {
            name: name.into(),
            locale: locale.into(),
        }
    }

    /// Create a new config load error
    pub fn config_load(msg: impl Into<String>) -> Self {
        Self::ConfigLoad(msg.into())
    }

    /// Check if this error is transient and worth retrying at the gateway
    ///
    /// Rate limits and content rejections are deliberately excluded: they are
    /// surfaced to the user instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::GatewayTimeout { .. } | Self::StreamInterrupted(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            // Providers format non-2xx responses as "<name> API error <status>: <body>"
            Self::ProviderApi(msg) => msg.contains("API error 5"),
            _ => false,
        }
    }

    /// Check if this error came from the language-model gateway
    pub fn is_gateway_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderApi(_)
                | Self::ProviderAuth(_)
                | Self::ProviderRateLimit { .. }
                | Self::ContentRejected(_)
                | Self::GatewayTimeout { .. }
                | Self::StreamInterrupted(_)
                | Self::Http(_)
        )
    }

    /// Text that can be shown to the person on the other side of the conversation
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderRateLimit { retry_after_secs } => format!(
                "I'm getting too many requests right now. Please try again in {} seconds.",
                retry_after_secs
            ),
            Self::ContentRejected(_) => {
                "I can't respond to that. Let's talk about something else.".to_string()
            }
            Self::GatewayTimeout { .. } => {
                "I took too long to think of a reply. Please try again.".to_string()
            }
            _ => "Something went wrong while generating a reply. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_not_retryable() {
        let err = Error::ProviderRateLimit { retry_after_secs: 5 };
        assert!(!err.is_retryable());
        assert!(err.is_gateway_error());
        assert!(err.user_message().contains("5 seconds"));
    }

    #[test]
    fn test_timeout_retryable() {
        let err = Error::GatewayTimeout { timeout_secs: 30 };
        assert!(err.is_retryable());
        assert!(err.is_gateway_error());
    }

    #[test]
    fn test_server_error_retryable() {
        let err = Error::ProviderApi("openai API error 503 Service Unavailable: busy".to_string());
        assert!(err.is_retryable());
        let err = Error::ProviderApi("openai API error 400 Bad Request: nope".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_content_rejection_not_retryable() {
        let err = Error::ContentRejected("flagged".to_string());
        assert!(!err.is_retryable());
        assert!(!err.user_message().is_empty());
    }

    #[test]
    fn test_pipeline_errors_are_not_gateway_errors() {
        assert!(!Error::prompt_not_found("persona", "en").is_gateway_error());
        assert!(!Error::config_load("missing").is_gateway_error());
    }
}
