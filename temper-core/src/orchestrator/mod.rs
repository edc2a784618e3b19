//! The per-turn pipeline
//!
//! classify → anger meter → route → (walk away | agent reply) → goodbye
//! check → history → diagnostics. Each conversation's state is passed in
//! and handed back explicitly, so one orchestrator serves any number of
//! conversations. Turns of the same conversation must not overlap.

pub mod insights;
pub mod routing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::agent::factory::AgentFactory;
use crate::agent::message::Message;
use crate::agent::variant::MoodVariant;
use crate::emotion::anger::AngerMeter;
use crate::emotion::config::AngerConfig;
use crate::emotion::lexicon;
use crate::emotion::sentiment::SentimentClassifier;
use crate::error::Result;
use crate::state::{self, EmotionState};

pub use insights::{describe_intensity, Diagnostics, TurnInsights};
pub use routing::{RoutingAction, RoutingDecision};

/// Appended after the history so every variant knows the thinking-tag convention
pub const THINKING_DIRECTIVE: &str = "You may put private thoughts, feelings or stage directions inside <t>...</t> tags. \
Text inside <t></t> is shown but never spoken aloud. Everything outside the tags is what you say. \
You may add a single emoji that matches your expression.";

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Locale used for prompt blocks
    pub locale: String,
    /// Reply returned once the conversation is over
    pub ended_notice: String,
    /// Scripted reply when the character walks away
    pub walk_away_reply: String,
    /// End the conversation when a reply says goodbye
    pub goodbye_detection: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            ended_notice: "<t>*The conversation has ended.*</t> Start a new conversation to talk again."
                .to_string(),
            walk_away_reply: "<t>*turns around and walks away*</t> I'M DONE. GOODBYE."
                .to_string(),
            goodbye_detection: true,
        }
    }
}

/// Result of one processed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Text to show or speak
    pub reply: String,
    /// Variant that produced the reply
    pub variant: MoodVariant,
    /// Why things went the way they did
    pub insights: TurnInsights,
    /// State to hand back on the next turn
    pub state: EmotionState,
}

/// JSON-friendly turn result for stateless request handlers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    /// Text to show or speak
    pub reply: String,
    /// Variant name
    pub variant: String,
    /// Why things went the way they did
    pub insights: TurnInsights,
    /// Opaque state the caller must return unchanged
    pub state: Value,
}

/// Coordinates classification, the anger meter, routing and agents
pub struct Orchestrator {
    classifier: SentimentClassifier,
    factory: Arc<AgentFactory>,
    anger_config: Arc<AngerConfig>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator
    pub fn new(
        classifier: SentimentClassifier,
        factory: Arc<AgentFactory>,
        anger_config: Arc<AngerConfig>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            classifier,
            factory,
            anger_config,
            config,
        }
    }

    /// The agent factory
    pub fn factory(&self) -> &Arc<AgentFactory> {
        &self.factory
    }

    /// Orchestrator settings
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Fresh state for a new conversation
    pub fn reset(&self) -> EmotionState {
        info!("Emotion state reset");
        state::create_initial_state()
    }

    /// Process one user turn
    ///
    /// Classifier failures degrade to neutral. Gateway failures while
    /// generating the reply are returned as errors; the prior state is then
    /// still the one to keep.
    #[instrument(skip_all, fields(history_len = history.len()))]
    pub async fn process_message(
        &self,
        utterance: &str,
        history: &[Message],
        prior: Option<EmotionState>,
    ) -> Result<TurnOutcome> {
        let mut state = prior.unwrap_or_default();

        if state.conversation_ended {
            info!("Conversation already ended, short-circuiting");
            let routing = RoutingDecision::ended(state.current_variant);
            let diagnostics = insights::ended_diagnostics(&routing, &state.emotional_history);
            return Ok(TurnOutcome {
                reply: self.config.ended_notice.clone(),
                variant: state.current_variant,
                insights: TurnInsights {
                    sentiment: None,
                    routing,
                    diagnostics,
                    anger: None,
                },
                state,
            });
        }

        let judgment = self.classifier.classify(utterance).await;

        // Anger is persistent, so the meter runs whatever the judgment says
        let mut meter = AngerMeter::from_state(Arc::clone(&self.anger_config), state.anger.clone());
        let (level, anger) = meter.process(utterance, &judgment);

        let mut routing = routing::route(&judgment, level, &anger, state.current_variant);
        let next = routing.next_variant;

        let (reply, ended) = if next == MoodVariant::Enraged && meter.is_maxed_out() {
            warn!(points = anger.points, "Anger meter maxed out, walking away");
            routing = routing.into_walk_away(&anger);
            (self.config.walk_away_reply.clone(), true)
        } else {
            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.extend_from_slice(history);
            messages.push(Message::user(utterance));
            messages.push(Message::system(THINKING_DIRECTIVE));

            let agent = self.factory.get_agent(next, &self.config.locale).await;
            let counter = (next == MoodVariant::Enraged).then_some(&anger);
            let reply = agent.generate_response(&messages, counter).await.inspect_err(|e| {
                warn!(variant = %next, error = %e, "Reply generation failed");
            })?;
            let goodbye = self.config.goodbye_detection && lexicon::contains_goodbye(&reply);
            (reply, goodbye)
        };

        let goodbye_detected = ended && routing.action != RoutingAction::WalkAway;
        if goodbye_detected {
            info!(variant = %next, "Goodbye detected, ending conversation");
        }

        state.anger = meter.into_state();
        state.conversation_ended = ended;
        state::append_history(
            &mut state.emotional_history,
            &judgment.emotion,
            judgment.intensity,
            next,
        );
        state.current_variant = next;

        let diagnostics = insights::build_diagnostics(
            &judgment,
            &routing,
            &state.emotional_history,
            goodbye_detected,
        );

        info!(
            variant = %next,
            action = routing.action.as_str(),
            points = anger.points,
            level = %anger.level,
            "Turn routed"
        );

        Ok(TurnOutcome {
            reply,
            variant: next,
            insights: TurnInsights {
                sentiment: Some(judgment),
                routing,
                diagnostics,
                anger: Some(anger),
            },
            state,
        })
    }

    /// Process a turn whose state travels as an opaque JSON value
    ///
    /// An empty history starts a new conversation and ignores `raw_state`.
    pub async fn handle_turn(
        &self,
        utterance: &str,
        history: &[Message],
        raw_state: Option<&Value>,
    ) -> Result<TurnResponse> {
        let prior = if state::is_new_conversation(history) {
            self.reset()
        } else {
            state::deserialize_with_config(raw_state, &self.anger_config)
        };

        let outcome = self.process_message(utterance, history, Some(prior)).await?;
        Ok(TurnResponse {
            reply: outcome.reply,
            variant: outcome.variant.name().to_string(),
            state: state::serialize(&outcome.state)?,
            insights: outcome.insights,
        })
    }
}
