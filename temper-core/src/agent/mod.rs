//! Agent layer: messages, providers, the gateway, prompts and mood agents

pub mod factory;
pub mod gateway;
pub mod message;
pub mod persona;
pub mod prompt;
pub mod provider;
pub mod streaming;
pub mod variant;

pub use factory::AgentFactory;
pub use gateway::{Gateway, GatewayConfig, GenerationParams};
pub use message::{Message, Role};
pub use persona::{AgentConfig, EnragedAgent, MoodAgent, VariantAgent};
pub use prompt::{CachedPromptProvider, PromptProvider, StaticPromptProvider};
pub use provider::{ChatRequest, Provider};
pub use variant::{MoodFamily, MoodVariant};
