//! Utilities shared by the HTTP providers

use bytes::{Buf, BytesMut};
use futures::{Stream, StreamExt};
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};

use crate::{Error, Result};

/// Phrases providers use when a request trips their safety filters
const CONTENT_POLICY_MARKERS: &[&str] = &["content_policy", "content policy", "content_filter", "safety"];

/// Accumulates raw SSE bytes and hands out complete events
///
/// Events are split on the blank-line delimiter, which is pure ASCII, so a
/// multi-byte character cut across network chunks is never split in half.
#[derive(Debug)]
pub struct SseBuffer {
    buffer: BytesMut,
    max_capacity: usize,
}

impl Default for SseBuffer {
    fn default() -> Self {
        Self {
            buffer: BytesMut::new(),
            max_capacity: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl SseBuffer {
    /// Create a new empty SSE buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom capacity limit
    pub fn with_capacity_limit(max_capacity: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_capacity,
        }
    }

    /// Add bytes to the buffer
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        if self.buffer.len() + bytes.len() > self.max_capacity {
            return Err(Error::StreamInterrupted(format!(
                "SSE buffer exceeded max capacity of {} bytes",
                self.max_capacity
            )));
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Pop the next complete event, if one is buffered
    pub fn next_event(&mut self) -> Result<Option<String>> {
        let Some((end, delimiter_len)) = self.find_delimiter() else {
            return Ok(None);
        };
        let event = self.buffer.split_to(end);
        self.buffer.advance(delimiter_len);
        String::from_utf8(event.to_vec())
            .map(Some)
            .map_err(|e| Error::StreamInterrupted(format!("Invalid UTF-8 in SSE stream: {}", e)))
    }

    fn find_delimiter(&self) -> Option<(usize, usize)> {
        let bytes = self.buffer.as_ref();
        (0..bytes.len()).find_map(|i| {
            if bytes[i..].starts_with(b"\n\n") {
                Some((i, 2))
            } else if bytes[i..].starts_with(b"\r\n\r\n") {
                Some((i, 4))
            } else {
                None
            }
        })
    }
}

/// Concatenated `data:` lines of one SSE event
pub fn event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Turn a byte stream into a stream of SSE `data` payloads
pub fn sse_data_stream<S>(stream: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    futures::stream::unfold(
        (stream, SseBuffer::new(), false),
        |(mut stream, mut buffer, finished)| async move {
            if finished {
                return None;
            }
            loop {
                match buffer.next_event() {
                    Ok(Some(event)) => {
                        if let Some(data) = event_data(&event) {
                            return Some((Ok(data), (stream, buffer, false)));
                        }
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => return Some((Err(e), (stream, buffer, true))),
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        if let Err(e) = buffer.extend_from_slice(&bytes) {
                            return Some((Err(e), (stream, buffer, true)));
                        }
                    }
                    Some(Err(e)) => return Some((Err(Error::Http(e)), (stream, buffer, true))),
                    None => return None,
                }
            }
        },
    )
}

/// Map a non-success HTTP status to a typed error
///
/// Non-specific failures keep the `"<provider> API error <status>: <body>"`
/// format the gateway uses to spot retryable 5xx responses.
pub fn status_error(provider: &str, status: StatusCode, retry_after: Option<u64>, body: &str) -> Error {
    let lowered = body.to_lowercase();
    match status {
        StatusCode::TOO_MANY_REQUESTS => Error::ProviderRateLimit {
            retry_after_secs: retry_after.unwrap_or(0),
        },
        StatusCode::UNAUTHORIZED => Error::ProviderAuth(format!("{} rejected the API key", provider)),
        StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN
            if CONTENT_POLICY_MARKERS.iter().any(|m| lowered.contains(m)) =>
        {
            Error::ContentRejected(format!("{}: {}", provider, body))
        }
        _ => Error::ProviderApi(format!("{} API error {}: {}", provider, status.as_u16(), body)),
    }
}

/// Pass a successful response through, or turn a failed one into an error
pub async fn check_response(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(provider, status = status.as_u16(), "Provider request failed");
    Err(status_error(provider, status, retry_after, &body))
}
