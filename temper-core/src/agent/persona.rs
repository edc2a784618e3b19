//! Mood-variant agents
//!
//! Each agent owns an immutable system prompt composed from the persona,
//! the shared style and memory rules, and its variant's instructions. The
//! enraged agent additionally renders the live rage counter into every call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::gateway::Gateway;
use crate::agent::message::Message;
use crate::agent::prompt::{
    variant_block, PromptProvider, CONSISTENT_MEMORY_BLOCK, LINGUISTIC_STYLE_BLOCK, PERSONA_BLOCK,
};
use crate::agent::variant::MoodVariant;
use crate::emotion::anger::AngerMeterInfo;
use crate::error::Result;

const FALLBACK_PERSONA: &str =
    "You are an expressive roleplay character chatting with the user. Stay in character.";
const FALLBACK_STYLE: &str = "Speak naturally and conversationally, in short spoken sentences.";
const FALLBACK_MEMORY: &str =
    "Stay consistent with everything already said in this conversation.";

/// Settings shared by every agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Most recent messages sent to the model (sliding window)
    pub max_history_messages: usize,
    /// Separator placed between prompt blocks
    pub prompt_separator: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_history_messages: 20,
            prompt_separator: "\n\n---\n\n".to_string(),
        }
    }
}

/// A persona response generator for one mood variant
#[async_trait]
pub trait MoodAgent: Send + Sync {
    /// Variant this agent speaks as
    fn variant(&self) -> MoodVariant;

    /// The composed system prompt
    fn system_prompt(&self) -> &str;

    /// Generate the next reply for `history`
    ///
    /// `anger` carries the meter readout for agents that render it.
    async fn generate_response(
        &self,
        history: &[Message],
        anger: Option<&AngerMeterInfo>,
    ) -> Result<String>;
}

/// Load the four prompt blocks and join them
///
/// A missing block never fails construction; it is replaced with a minimal
/// generic text and logged.
pub async fn compose_system_prompt(
    variant: MoodVariant,
    prompts: &dyn PromptProvider,
    locale: &str,
    separator: &str,
) -> String {
    let variant_name = variant_block(variant.name());
    let variant_fallback = format!(
        "Right now you feel {}. Let that mood shape every reply.",
        variant.description()
    );

    let blocks = [
        (PERSONA_BLOCK, FALLBACK_PERSONA.to_string()),
        (LINGUISTIC_STYLE_BLOCK, FALLBACK_STYLE.to_string()),
        (CONSISTENT_MEMORY_BLOCK, FALLBACK_MEMORY.to_string()),
        (variant_name.as_str(), variant_fallback),
    ];

    let mut parts = Vec::with_capacity(blocks.len());
    for (name, fallback) in blocks {
        match prompts.load(name, locale).await {
            Ok(text) => parts.push(text),
            Err(e) => {
                warn!(block = name, locale, error = %e, "Prompt block unavailable, using fallback");
                parts.push(fallback);
            }
        }
    }

    parts.join(separator)
}

/// Standard agent: system prompt + recent history, fixed sampling settings
pub struct VariantAgent {
    variant: MoodVariant,
    system_prompt: String,
    gateway: Gateway,
    config: AgentConfig,
}

impl VariantAgent {
    /// Create an agent from an already composed prompt
    pub fn new(variant: MoodVariant, system_prompt: String, gateway: Gateway, config: AgentConfig) -> Self {
        Self {
            variant,
            system_prompt,
            gateway,
            config,
        }
    }

    /// Compose the prompt for `variant` and build the agent
    pub async fn build(
        variant: MoodVariant,
        gateway: Gateway,
        prompts: &dyn PromptProvider,
        locale: &str,
        config: AgentConfig,
    ) -> Self {
        let system_prompt =
            compose_system_prompt(variant, prompts, locale, &config.prompt_separator).await;
        Self::new(variant, system_prompt, gateway, config)
    }

    /// System prompt followed by the trimmed history
    fn build_messages(&self, history: &[Message]) -> Vec<Message> {
        let start = history.len().saturating_sub(self.config.max_history_messages);
        let mut messages = Vec::with_capacity(history.len() - start + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend_from_slice(&history[start..]);
        messages
    }
}

#[async_trait]
impl MoodAgent for VariantAgent {
    fn variant(&self) -> MoodVariant {
        self.variant
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    async fn generate_response(
        &self,
        history: &[Message],
        _anger: Option<&AngerMeterInfo>,
    ) -> Result<String> {
        let messages = self.build_messages(history);
        debug!(variant = %self.variant, message_count = messages.len(), "Generating reply");
        self.gateway
            .call(messages, &self.variant.generation_params())
            .await
    }
}

/// Rage level 1..=3 from the share of the point ceiling
pub fn rage_level(points: f64, max_points: f64) -> u8 {
    if max_points <= 0.0 {
        return 1;
    }
    let pct = points / max_points * 100.0;
    if pct >= 90.0 {
        3
    } else if pct >= 70.0 {
        2
    } else {
        1
    }
}

/// The counter string shown at the top of enraged replies
pub fn rage_display(info: &AngerMeterInfo) -> String {
    format!(
        "🔥 {:.0}/{:.0} pts (LVL {})",
        info.points,
        info.max_points,
        rage_level(info.points, info.max_points)
    )
}

/// Top anger tier: injects the live rage counter before every reply
pub struct EnragedAgent {
    base: VariantAgent,
}

impl EnragedAgent {
    /// Wrap a base agent built for [`MoodVariant::Enraged`]
    pub fn new(base: VariantAgent) -> Self {
        Self { base }
    }

    fn counter_instructions(info: &AngerMeterInfo) -> [Message; 2] {
        let display = rage_display(info);
        let level = rage_level(info.points, info.max_points);
        [
            Message::system(format!(
                "Open your reply with this exact rage counter wrapped in thinking tags, before anything else: <t>{}</t>",
                display
            )),
            Message::system(format!(
                "Your rage is at LVL {} of 3. Write the rest of your reply IN ALL CAPS, with fury matching LVL {}.",
                level, level
            )),
        ]
    }
}

#[async_trait]
impl MoodAgent for EnragedAgent {
    fn variant(&self) -> MoodVariant {
        MoodVariant::Enraged
    }

    fn system_prompt(&self) -> &str {
        self.base.system_prompt()
    }

    async fn generate_response(
        &self,
        history: &[Message],
        anger: Option<&AngerMeterInfo>,
    ) -> Result<String> {
        let Some(info) = anger else {
            return self.base.generate_response(history, None).await;
        };

        let mut messages = self.base.build_messages(history);
        messages.extend(Self::counter_instructions(info));
        debug!(counter = %rage_display(info), "Generating enraged reply");
        self.base
            .gateway
            .call(messages, &MoodVariant::Enraged.generation_params())
            .await
    }
}

/// Build the right agent type for `variant`
pub async fn build_agent(
    variant: MoodVariant,
    gateway: Gateway,
    prompts: &dyn PromptProvider,
    locale: &str,
    config: AgentConfig,
) -> Arc<dyn MoodAgent> {
    let base = VariantAgent::build(variant, gateway, prompts, locale, config).await;
    match variant {
        MoodVariant::Enraged => Arc::new(EnragedAgent::new(base)),
        _ => Arc::new(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt::StaticPromptProvider;

    #[test]
    fn test_rage_level_cutoffs() {
        assert_eq!(rage_level(10.0, 100.0), 1);
        assert_eq!(rage_level(69.9, 100.0), 1);
        assert_eq!(rage_level(70.0, 100.0), 2);
        assert_eq!(rage_level(89.0, 100.0), 2);
        assert_eq!(rage_level(90.0, 100.0), 3);
        assert_eq!(rage_level(100.0, 100.0), 3);
    }

    #[tokio::test]
    async fn test_compose_uses_blocks_and_fallbacks() {
        let prompts = StaticPromptProvider::default()
            .with_block(PERSONA_BLOCK, "en", "You are Rex, a grumpy librarian.")
            .with_block(variant_block("sad_high"), "en", "You just lost your favourite book.");

        let prompt = compose_system_prompt(MoodVariant::SadHigh, &prompts, "en", "\n--\n").await;
        let parts: Vec<&str> = prompt.split("\n--\n").collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "You are Rex, a grumpy librarian.");
        assert_eq!(parts[1], FALLBACK_STYLE);
        assert_eq!(parts[2], FALLBACK_MEMORY);
        assert_eq!(parts[3], "You just lost your favourite book.");
    }

    #[tokio::test]
    async fn test_missing_variant_block_mentions_mood() {
        let prompts = StaticPromptProvider::default();
        let prompt = compose_system_prompt(MoodVariant::Irritated, &prompts, "en", "|").await;
        assert!(prompt.ends_with(&format!(
            "Right now you feel {}. Let that mood shape every reply.",
            MoodVariant::Irritated.description()
        )));
    }
}
