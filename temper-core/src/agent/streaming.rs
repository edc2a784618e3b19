//! Completions as they arrive from a provider
//!
//! Reasoning models emit their thinking and their reply as separate chunks.
//! Only reply text ever reaches the conversation; thinking is kept apart so it
//! can be logged.

use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::error::{Error, Result};

/// One chunk of a completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamingChoice {
    /// Reply text
    Message(String),
    /// Model reasoning, never shown as part of the reply
    Thought(String),
    /// End of the completion
    Done,
}

/// Reply and reasoning gathered from one stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Concatenated reply text
    pub text: String,
    /// Concatenated reasoning text, empty for most models
    pub thought: String,
}

/// A provider's chunk stream
pub struct StreamingResponse {
    chunks: BoxStream<'static, Result<StreamingChoice>>,
}

impl StreamingResponse {
    /// Wrap a chunk stream
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamingChoice>> + Send + 'static,
    {
        Self {
            chunks: stream.boxed(),
        }
    }

    /// Drain the stream up to `Done` (or its end)
    ///
    /// The first error chunk aborts the whole completion.
    pub async fn collect(mut self) -> Result<Completion> {
        let mut completion = Completion::default();
        while let Some(chunk) = self.chunks.next().await {
            match chunk? {
                StreamingChoice::Message(text) => completion.text.push_str(&text),
                StreamingChoice::Thought(text) => completion.thought.push_str(&text),
                StreamingChoice::Done => break,
            }
        }
        Ok(completion)
    }

    /// Reply text only
    pub async fn collect_text(self) -> Result<String> {
        Ok(self.collect().await?.text)
    }
}

/// Scripted chunk streams for tests and mock providers
#[derive(Default)]
pub struct MockStreamBuilder {
    chunks: Vec<Result<StreamingChoice>>,
}

impl MockStreamBuilder {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply text
    pub fn message(self, text: impl Into<String>) -> Self {
        self.push(Ok(StreamingChoice::Message(text.into())))
    }

    /// Reasoning text
    pub fn thought(self, text: impl Into<String>) -> Self {
        self.push(Ok(StreamingChoice::Thought(text.into())))
    }

    /// End marker
    pub fn done(self) -> Self {
        self.push(Ok(StreamingChoice::Done))
    }

    /// Failure mid-stream
    pub fn error(self, error: Error) -> Self {
        self.push(Err(error))
    }

    fn push(mut self, chunk: Result<StreamingChoice>) -> Self {
        self.chunks.push(chunk);
        self
    }

    /// Finish the script
    pub fn build(self) -> StreamingResponse {
        StreamingResponse::from_stream(stream::iter(self.chunks))
    }
}
