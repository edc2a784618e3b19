//! Choosing the variant that answers a turn
//!
//! Priority, first match wins: accumulated anger, happiness, sadness,
//! neutral. Anger comes from the meter rather than the current judgment, so
//! a calm message to an angry character still gets an angry reply.

use serde::{Deserialize, Serialize};

use crate::agent::variant::MoodVariant;
use crate::emotion::anger::{AngerLevel, AngerMeterInfo};
use crate::emotion::lexicon;
use crate::emotion::sentiment::SentimentJudgment;

/// Intensity at or above which the high tier is used
pub const HIGH_INTENSITY: f64 = 0.7;
/// Intensity at or above which the medium tier is used
pub const MEDIUM_INTENSITY: f64 = 0.4;

/// Machine-readable reason for a routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingAction {
    /// The anger meter is above normal
    PersistentAnger,
    /// Happiness-family emotion
    Happiness,
    /// Sadness-family emotion
    Sadness,
    /// Nothing else matched
    Neutral,
    /// The meter hit its ceiling while enraged and the character left
    WalkAway,
    /// The conversation had already ended
    ConversationEnded,
}

impl RoutingAction {
    /// snake_case tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersistentAnger => "persistent_anger",
            Self::Happiness => "happiness",
            Self::Sadness => "sadness",
            Self::Neutral => "neutral",
            Self::WalkAway => "walk_away",
            Self::ConversationEnded => "conversation_ended",
        }
    }
}

/// Why a variant was chosen; for observability only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    /// Variant that answered the previous turn
    pub current_variant: MoodVariant,
    /// Variant answering this turn
    pub next_variant: MoodVariant,
    /// Branch taken
    pub action: RoutingAction,
    /// Human-readable explanation
    pub rationale: String,
    /// Signals that drove the decision
    pub triggers: Vec<String>,
}

impl RoutingDecision {
    /// Decision recorded when the conversation was already over
    pub fn ended(current: MoodVariant) -> Self {
        Self {
            current_variant: current,
            next_variant: current,
            action: RoutingAction::ConversationEnded,
            rationale: "Conversation already ended; no further processing".to_string(),
            triggers: vec!["conversation_ended".to_string()],
        }
    }

    /// Turn this decision into a walk-away
    pub fn into_walk_away(mut self, info: &AngerMeterInfo) -> Self {
        self.action = RoutingAction::WalkAway;
        self.rationale = format!(
            "Anger meter maxed out at {:.0}/{:.0} while enraged; the character walks away",
            info.points, info.max_points
        );
        self.triggers.push("anger_ceiling".to_string());
        self
    }
}

/// Pick one of three tiers by intensity
fn tier(intensity: f64, low: MoodVariant, medium: MoodVariant, high: MoodVariant) -> MoodVariant {
    if intensity >= HIGH_INTENSITY {
        high
    } else if intensity >= MEDIUM_INTENSITY {
        medium
    } else {
        low
    }
}

/// Decide the next variant from this turn's judgment and the meter's level
pub fn route(
    judgment: &SentimentJudgment,
    anger_level: AngerLevel,
    anger: &AngerMeterInfo,
    current: MoodVariant,
) -> RoutingDecision {
    let emotion = judgment.emotion.as_str();
    let intensity = judgment.intensity;
    let mut triggers = vec![format!("emotion:{}", emotion)];

    let (next, action, rationale) = if let Some(angry) = MoodVariant::from_anger_level(anger_level) {
        triggers.push(format!("anger_level:{}", anger_level));
        triggers.extend(anger.signals.names().into_iter().map(|s| format!("signal:{}", s)));
        let rationale = if anger.is_angry {
            format!(
                "Anger meter at {:.1} points ({}) after an angry message",
                anger.points, anger_level
            )
        } else {
            format!(
                "Anger persists at {:.1} points ({}) even though this message reads as {}",
                anger.points, anger_level, emotion
            )
        };
        (angry, RoutingAction::PersistentAnger, rationale)
    } else if lexicon::is_happy_emotion(emotion) {
        let next = tier(
            intensity,
            MoodVariant::HappyLow,
            MoodVariant::HappyMedium,
            MoodVariant::HappyHigh,
        );
        (
            next,
            RoutingAction::Happiness,
            format!("User expresses {} at intensity {:.2}", emotion, intensity),
        )
    } else if lexicon::is_sad_emotion(emotion) {
        let next = tier(
            intensity,
            MoodVariant::SadLow,
            MoodVariant::SadMedium,
            MoodVariant::SadHigh,
        );
        (
            next,
            RoutingAction::Sadness,
            format!("User expresses {} at intensity {:.2}", emotion, intensity),
        )
    } else {
        (
            MoodVariant::Neutral,
            RoutingAction::Neutral,
            format!("No strong routable emotion ({}), staying balanced", emotion),
        )
    };

    RoutingDecision {
        current_variant: current,
        next_variant: next,
        action,
        rationale,
        triggers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::config::AngerConfig;
    use crate::emotion::anger::AngerMeter;
    use std::sync::Arc;

    fn calm_info() -> AngerMeterInfo {
        let mut meter = AngerMeter::new(Arc::new(AngerConfig::default()));
        meter.process("hello", &SentimentJudgment::new("neutral", 0.2)).1
    }

    fn routed(emotion: &str, intensity: f64) -> RoutingDecision {
        route(
            &SentimentJudgment::new(emotion, intensity),
            AngerLevel::Normal,
            &calm_info(),
            MoodVariant::Neutral,
        )
    }

    #[test]
    fn test_happy_and_sad_tiers() {
        assert_eq!(routed("joy", 0.9).next_variant, MoodVariant::HappyHigh);
        assert_eq!(routed("joy", 0.7).next_variant, MoodVariant::HappyHigh);
        assert_eq!(routed("excitement", 0.5).next_variant, MoodVariant::HappyMedium);
        assert_eq!(routed("gratitude", 0.39).next_variant, MoodVariant::HappyLow);
        assert_eq!(routed("grief", 0.4).next_variant, MoodVariant::SadMedium);
        assert_eq!(routed("sadness", 0.1).next_variant, MoodVariant::SadLow);
        assert_eq!(routed("sadness", 0.1).action, RoutingAction::Sadness);
    }

    #[test]
    fn test_unrouted_emotion_is_neutral() {
        let decision = routed("surprise", 0.9);
        assert_eq!(decision.next_variant, MoodVariant::Neutral);
        assert_eq!(decision.action, RoutingAction::Neutral);
        assert_eq!(decision.triggers, vec!["emotion:surprise".to_string()]);
    }

    #[test]
    fn test_persistent_anger_beats_happiness() {
        let decision = route(
            &SentimentJudgment::new("joy", 0.95),
            AngerLevel::Agitated,
            &calm_info(),
            MoodVariant::Agitated,
        );
        assert_eq!(decision.next_variant, MoodVariant::Agitated);
        assert_eq!(decision.action, RoutingAction::PersistentAnger);
        assert!(decision.rationale.contains("persists"));
        assert!(decision.triggers.contains(&"anger_level:agitated".to_string()));
    }

    #[test]
    fn test_action_tags_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(RoutingAction::PersistentAnger).unwrap(),
            serde_json::json!("persistent_anger")
        );
        assert_eq!(RoutingAction::WalkAway.as_str(), "walk_away");
    }
}
