//! Lazily built, cached mood agents

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::agent::gateway::Gateway;
use crate::agent::persona::{build_agent, AgentConfig, MoodAgent};
use crate::agent::prompt::PromptProvider;
use crate::agent::variant::MoodVariant;

/// Owns one agent per (variant, locale)
///
/// Agents are stateless wrappers around a prompt and the gateway, so a single
/// factory can be shared by every conversation.
pub struct AgentFactory {
    gateway: Gateway,
    prompts: Arc<dyn PromptProvider>,
    config: AgentConfig,
    agents: DashMap<(MoodVariant, String), Arc<dyn MoodAgent>>,
}

impl AgentFactory {
    /// Create an empty factory
    pub fn new(gateway: Gateway, prompts: Arc<dyn PromptProvider>, config: AgentConfig) -> Self {
        Self {
            gateway,
            prompts,
            config,
            agents: DashMap::new(),
        }
    }

    /// Get (building on first use) the agent for `variant` in `locale`
    pub async fn get_agent(&self, variant: MoodVariant, locale: &str) -> Arc<dyn MoodAgent> {
        let key = (variant, locale.to_string());
        if let Some(agent) = self.agents.get(&key) {
            return agent.value().clone();
        }

        info!(variant = %variant, locale, "Building mood agent");
        let agent = build_agent(
            variant,
            self.gateway.clone(),
            self.prompts.as_ref(),
            locale,
            self.config.clone(),
        )
        .await;

        // A concurrent build may have won the race; keep whichever landed first
        self.agents.entry(key).or_insert(agent).value().clone()
    }

    /// Look an agent up by variant name, falling back to neutral for unknown names
    pub async fn get_agent_by_name(&self, name: &str, locale: &str) -> Arc<dyn MoodAgent> {
        let variant = MoodVariant::parse(name).unwrap_or_else(|| {
            warn!(name, "Unknown mood variant, using neutral");
            MoodVariant::Neutral
        });
        self.get_agent(variant, locale).await
    }

    /// Number of constructed agents
    pub fn cached_count(&self) -> usize {
        self.agents.len()
    }

    /// Drop every cached agent, e.g. after prompt blocks changed
    pub fn clear_cache(&self) {
        self.agents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt::{StaticPromptProvider, PERSONA_BLOCK};
    use crate::agent::provider::{ChatRequest, Provider};
    use crate::agent::streaming::{MockStreamBuilder, StreamingResponse};
    use crate::error::Result;
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl Provider for Silent {
        async fn stream_completion(&self, _request: ChatRequest) -> Result<StreamingResponse> {
            Ok(MockStreamBuilder::new().message("...").done().build())
        }

        fn name(&self) -> &'static str {
            "silent"
        }
    }

    fn factory() -> AgentFactory {
        let prompts = StaticPromptProvider::default()
            .with_block(PERSONA_BLOCK, "en", "English persona")
            .with_block(PERSONA_BLOCK, "es", "Persona en español");
        AgentFactory::new(
            Gateway::with_provider(Silent),
            Arc::new(prompts),
            AgentConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_agents_are_cached_per_locale() {
        let factory = factory();

        let a = factory.get_agent(MoodVariant::HappyHigh, "en").await;
        let b = factory.get_agent(MoodVariant::HappyHigh, "en").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.cached_count(), 1);

        let c = factory.get_agent(MoodVariant::HappyHigh, "es").await;
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(c.system_prompt().starts_with("Persona en español"));
        assert_eq!(factory.cached_count(), 2);

        factory.clear_cache();
        assert_eq!(factory.cached_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_name_normalizes_to_neutral() {
        let factory = factory();
        let agent = factory.get_agent_by_name("ecstatic", "en").await;
        assert_eq!(agent.variant(), MoodVariant::Neutral);

        let agent = factory.get_agent_by_name("Enraged", "en").await;
        assert_eq!(agent.variant(), MoodVariant::Enraged);
    }
}
