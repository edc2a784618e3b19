//! Prompt blocks and their providers
//!
//! Agents never read prompt text from a global location; they receive a
//! [`PromptProvider`] and ask it for named blocks in the active locale.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{Error, Result};

/// Base persona description
pub const PERSONA_BLOCK: &str = "persona";
/// Shared linguistic style rules
pub const LINGUISTIC_STYLE_BLOCK: &str = "linguistic_style";
/// Shared rules for staying consistent with earlier turns
pub const CONSISTENT_MEMORY_BLOCK: &str = "consistent_memory";

/// Name of the variant-specific instruction block
pub fn variant_block(variant_name: &str) -> String {
    format!("variants/{}", variant_name)
}

/// Source of named prompt blocks
#[async_trait]
pub trait PromptProvider: Send + Sync {
    /// Load the block `name` for `locale`
    ///
    /// Returns [`Error::PromptNotFound`] when the block does not exist.
    async fn load(&self, name: &str, locale: &str) -> Result<String>;
}

/// Prompt blocks held in memory, with a default-locale fallback
#[derive(Debug, Clone)]
pub struct StaticPromptProvider {
    blocks: HashMap<(String, String), String>,
    default_locale: String,
}

impl StaticPromptProvider {
    /// Create an empty provider falling back to `default_locale`
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            blocks: HashMap::new(),
            default_locale: default_locale.into(),
        }
    }

    /// Add or replace a block
    pub fn insert(&mut self, name: impl Into<String>, locale: impl Into<String>, text: impl Into<String>) {
        self.blocks.insert((name.into(), locale.into()), text.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_block(
        mut self,
        name: impl Into<String>,
        locale: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.insert(name, locale, text);
        self
    }
}

impl Default for StaticPromptProvider {
    fn default() -> Self {
        Self::new("en")
    }
}

#[async_trait]
impl PromptProvider for StaticPromptProvider {
    async fn load(&self, name: &str, locale: &str) -> Result<String> {
        self.blocks
            .get(&(name.to_string(), locale.to_string()))
            .or_else(|| {
                self.blocks
                    .get(&(name.to_string(), self.default_locale.clone()))
            })
            .cloned()
            .ok_or_else(|| Error::prompt_not_found(name, locale))
    }
}

/// Memoises successful lookups of an inner provider
///
/// Misses are not cached, so a block that appears later is still picked up.
pub struct CachedPromptProvider<P: PromptProvider> {
    inner: P,
    store: DashMap<(String, String), String>,
}

impl<P: PromptProvider> CachedPromptProvider<P> {
    /// Wrap `inner`
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            store: DashMap::new(),
        }
    }

    /// Number of cached blocks
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether nothing is cached yet
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop every cached block
    pub fn clear(&self) {
        self.store.clear();
    }
}

#[async_trait]
impl<P: PromptProvider> PromptProvider for CachedPromptProvider<P> {
    async fn load(&self, name: &str, locale: &str) -> Result<String> {
        let key = (name.to_string(), locale.to_string());
        if let Some(hit) = self.store.get(&key) {
            return Ok(hit.value().clone());
        }

        let text = self.inner.load(name, locale).await?;
        self.store.insert(key, text.clone());
        Ok(text)
    }
}
