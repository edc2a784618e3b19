//! The ten mood variants an agent can answer in

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::gateway::GenerationParams;
use crate::emotion::anger::AngerLevel;

/// Emotional family a variant belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodFamily {
    /// Baseline
    Neutral,
    /// Happiness tiers
    Happy,
    /// Sadness tiers
    Sad,
    /// Anger tiers, driven by the anger meter
    Angry,
}

/// One persona response style, tied to an emotional tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodVariant {
    /// Calm baseline
    #[default]
    Neutral,
    /// Mildly pleased
    HappyLow,
    /// Cheerful
    HappyMedium,
    /// Elated
    HappyHigh,
    /// Slightly down
    SadLow,
    /// Sad
    SadMedium,
    /// Deeply sad
    SadHigh,
    /// First anger tier
    Irritated,
    /// Second anger tier
    Agitated,
    /// Top anger tier
    Enraged,
}

impl MoodVariant {
    /// Every variant, neutral first
    pub const ALL: [MoodVariant; 10] = [
        MoodVariant::Neutral,
        MoodVariant::HappyLow,
        MoodVariant::HappyMedium,
        MoodVariant::HappyHigh,
        MoodVariant::SadLow,
        MoodVariant::SadMedium,
        MoodVariant::SadHigh,
        MoodVariant::Irritated,
        MoodVariant::Agitated,
        MoodVariant::Enraged,
    ];

    /// Stable name, also used in serialized state and prompt block names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::HappyLow => "happy_low",
            Self::HappyMedium => "happy_medium",
            Self::HappyHigh => "happy_high",
            Self::SadLow => "sad_low",
            Self::SadMedium => "sad_medium",
            Self::SadHigh => "sad_high",
            Self::Irritated => "irritated",
            Self::Agitated => "agitated",
            Self::Enraged => "enraged",
        }
    }

    /// Parse a variant name, tolerating case, whitespace and dashes
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|v| v.name() == normalized)
    }

    /// Family of this variant
    pub fn family(&self) -> MoodFamily {
        match self {
            Self::Neutral => MoodFamily::Neutral,
            Self::HappyLow | Self::HappyMedium | Self::HappyHigh => MoodFamily::Happy,
            Self::SadLow | Self::SadMedium | Self::SadHigh => MoodFamily::Sad,
            Self::Irritated | Self::Agitated | Self::Enraged => MoodFamily::Angry,
        }
    }

    /// The angry variant for an anger level; `None` for a calm meter
    pub fn from_anger_level(level: AngerLevel) -> Option<Self> {
        match level {
            AngerLevel::Normal => None,
            AngerLevel::Irritated => Some(Self::Irritated),
            AngerLevel::Agitated => Some(Self::Agitated),
            AngerLevel::Enraged => Some(Self::Enraged),
        }
    }

    /// Short description used in prompts and diagnostics
    pub fn description(&self) -> &'static str {
        match self {
            Self::Neutral => "calm, balanced and attentive",
            Self::HappyLow => "quietly pleased and warm",
            Self::HappyMedium => "cheerful, upbeat and playful",
            Self::HappyHigh => "overjoyed, bubbly and enthusiastic",
            Self::SadLow => "a little downcast and wistful",
            Self::SadMedium => "openly sad, subdued and vulnerable",
            Self::SadHigh => "heartbroken, tearful and withdrawn",
            Self::Irritated => "short-tempered, curt and visibly annoyed",
            Self::Agitated => "openly angry, sharp and confrontational",
            Self::Enraged => "furious, shouting and barely holding it together",
        }
    }

    /// Fixed sampling settings for this variant
    pub fn generation_params(&self) -> GenerationParams {
        let (temperature, max_tokens) = match self {
            Self::Neutral => (0.7, 300),
            Self::HappyLow => (0.75, 300),
            Self::HappyMedium => (0.8, 300),
            Self::HappyHigh => (0.9, 320),
            Self::SadLow => (0.65, 300),
            Self::SadMedium => (0.6, 280),
            Self::SadHigh => (0.55, 260),
            Self::Irritated => (0.8, 250),
            Self::Agitated => (0.9, 280),
            Self::Enraged => (1.0, 350),
        };
        GenerationParams::new(temperature, max_tokens)
    }
}

impl fmt::Display for MoodVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for variant in MoodVariant::ALL {
            assert_eq!(MoodVariant::parse(variant.name()), Some(variant));
        }
        assert_eq!(MoodVariant::parse(" Happy-High "), Some(MoodVariant::HappyHigh));
        assert_eq!(MoodVariant::parse("furious"), None);
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_value(MoodVariant::SadMedium).unwrap();
        assert_eq!(json, serde_json::json!("sad_medium"));
    }

    #[test]
    fn test_anger_levels_map_to_angry_family() {
        assert_eq!(MoodVariant::from_anger_level(AngerLevel::Normal), None);
        for level in [AngerLevel::Irritated, AngerLevel::Agitated, AngerLevel::Enraged] {
            let variant = MoodVariant::from_anger_level(level).unwrap();
            assert_eq!(variant.family(), MoodFamily::Angry);
            assert_eq!(variant.name(), level.name());
        }
    }
}
