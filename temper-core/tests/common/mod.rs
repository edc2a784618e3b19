//! Shared fixtures: a provider that answers classifier and agent calls from
//! separate scripts.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use temper_core::agent::prompt::{StaticPromptProvider, PERSONA_BLOCK};
use temper_core::agent::streaming::MockStreamBuilder;
use temper_core::prelude::*;

pub const DEFAULT_JUDGMENT: &str = r#"{"emotion": "neutral", "intensity": 0.3, "indicators": [], "rationale": "Small talk."}"#;
pub const DEFAULT_REPLY: &str = "<t>*nods*</t> Sure, tell me more.";

#[derive(Default)]
pub struct ScriptedProvider {
    judgments: Mutex<VecDeque<Result<String>>>,
    replies: Mutex<VecDeque<Result<String>>>,
    classify_requests: Mutex<Vec<ChatRequest>>,
    reply_requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn judge(&self, emotion: &str, intensity: f64) {
        self.judge_raw(format!(
            r#"{{"emotion": "{}", "intensity": {}, "indicators": [], "rationale": "scripted"}}"#,
            emotion, intensity
        ));
    }

    pub fn judge_raw(&self, raw: impl Into<String>) {
        self.judgments.lock().push_back(Ok(raw.into()));
    }

    pub fn fail_judge(&self, error: Error) {
        self.judgments.lock().push_back(Err(error));
    }

    pub fn reply(&self, text: impl Into<String>) {
        self.replies.lock().push_back(Ok(text.into()));
    }

    pub fn fail_reply(&self, error: Error) {
        self.replies.lock().push_back(Err(error));
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_requests.lock().len()
    }

    pub fn classify_requests(&self) -> Vec<ChatRequest> {
        self.classify_requests.lock().clone()
    }

    pub fn reply_requests(&self) -> Vec<ChatRequest> {
        self.reply_requests.lock().clone()
    }

    fn is_classification(request: &ChatRequest) -> bool {
        request
            .messages
            .first()
            .is_some_and(|m| m.role == Role::System && m.content.contains("sentiment analysis engine"))
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        let next = if Self::is_classification(&request) {
            self.classify_requests.lock().push(request);
            self.judgments
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(DEFAULT_JUDGMENT.to_string()))
        } else {
            self.reply_requests.lock().push(request);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))
        };

        let text = next?;
        Ok(MockStreamBuilder::new()
            .thought("scripted")
            .message(text)
            .done()
            .build())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn gateway(provider: &Arc<ScriptedProvider>) -> Gateway {
    Gateway::new(provider.clone(), GatewayConfig::default())
}

pub fn orchestrator(provider: &Arc<ScriptedProvider>) -> Orchestrator {
    orchestrator_with(provider, AngerConfig::default())
}

pub fn orchestrator_with(provider: &Arc<ScriptedProvider>, anger: AngerConfig) -> Orchestrator {
    let prompts = StaticPromptProvider::default().with_block(
        PERSONA_BLOCK,
        "en",
        "You are Rex, a librarian with a short fuse.",
    );
    let factory = AgentFactory::new(gateway(provider), Arc::new(prompts), AgentConfig::default());
    Orchestrator::new(
        SentimentClassifier::new(gateway(provider), ClassifierConfig::default()),
        Arc::new(factory),
        Arc::new(anger),
        OrchestratorConfig::default(),
    )
}
