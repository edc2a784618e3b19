//! Prelude: Re-exports common types for convenience
//!
//! # Usage
//! ```
//! use temper_core::prelude::*;
//! ```

pub use crate::error::{Error, Result};

// Agents
pub use crate::agent::factory::AgentFactory;
pub use crate::agent::gateway::{Gateway, GatewayConfig, GenerationParams};
pub use crate::agent::message::{Message, Role};
pub use crate::agent::persona::{AgentConfig, MoodAgent};
pub use crate::agent::prompt::{CachedPromptProvider, PromptProvider, StaticPromptProvider};
pub use crate::agent::provider::{ChatRequest, CircuitBreakerConfig, Provider, ResilientProvider};
pub use crate::agent::streaming::{StreamingChoice, StreamingResponse};
pub use crate::agent::variant::MoodVariant;

// Emotion
pub use crate::emotion::anger::{AngerLevel, AngerMeter, AngerMeterInfo};
pub use crate::emotion::config::AngerConfig;
pub use crate::emotion::sentiment::{ClassifierConfig, SentimentClassifier, SentimentJudgment};

// Orchestration
pub use crate::orchestrator::{Orchestrator, OrchestratorConfig, TurnOutcome, TurnResponse};
pub use crate::state::EmotionState;
