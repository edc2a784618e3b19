//! Serializable emotion state
//!
//! The whole cross-turn memory of a conversation lives in [`EmotionState`].
//! Callers store the serialized form and hand it back on the next turn; the
//! functions here turn that opaque value back into a valid state, defaulting
//! any field that is missing or malformed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::agent::message::Message;
use crate::agent::variant::MoodVariant;
use crate::emotion::anger::{clamp_points, AngerLevel, AngerMeterState, POINT_HISTORY_LEN};
use crate::emotion::config::AngerConfig;
use crate::error::Result;

/// Entries kept in the emotional history window
pub const MAX_EMOTIONAL_HISTORY: usize = 5;

/// Entries summarized in the trajectory string
const TRAJECTORY_WINDOW: usize = 3;

/// Intensity change that counts as a trend
const TREND_THRESHOLD: f64 = 0.1;

/// One turn's emotion, kept for trend narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalHistoryEntry {
    /// Classifier label
    pub emotion: String,
    /// Classifier intensity
    pub intensity: f64,
    /// Variant that answered the turn
    pub variant: MoodVariant,
}

/// Full per-conversation state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionState {
    /// Anger meter fields, flattened into the top level
    #[serde(flatten)]
    pub anger: AngerMeterState,
    /// Variant that answered the last turn
    pub current_variant: MoodVariant,
    /// Most recent emotions, oldest first
    pub emotional_history: Vec<EmotionalHistoryEntry>,
    /// Set once the character has left
    pub conversation_ended: bool,
}

/// True iff no messages have been exchanged yet
pub fn is_new_conversation(history: &[Message]) -> bool {
    history.is_empty()
}

/// State of a conversation that has not started
pub fn create_initial_state() -> EmotionState {
    EmotionState::default()
}

/// Serialize to the opaque value handed to the caller
pub fn serialize(state: &EmotionState) -> Result<Value> {
    Ok(serde_json::to_value(state)?)
}

/// Rebuild a state from a caller-provided value
///
/// Never fails. Each field is read on its own; anything missing or of the
/// wrong shape takes its initial value and a warning is logged. Points are
/// held to the default meter range.
pub fn deserialize(raw: Option<&Value>) -> EmotionState {
    deserialize_with_config(raw, &AngerConfig::default())
}

/// [`deserialize`], holding points to the range of `config`
pub fn deserialize_with_config(raw: Option<&Value>, config: &AngerConfig) -> EmotionState {
    let Some(raw) = raw else {
        return create_initial_state();
    };
    let Some(obj) = raw.as_object() else {
        if !raw.is_null() {
            warn!("Emotion state is not an object, starting fresh");
        }
        return create_initial_state();
    };

    let fields = Fields(obj);
    let anger = AngerMeterState {
        points: clamp_points(fields.number("points").unwrap_or_default(), config),
        level: fields
            .parsed("level", AngerLevel::parse)
            .unwrap_or_default(),
        consecutive_anger_streak: fields.count("consecutiveAngerStreak").unwrap_or_default(),
        last_emotion: fields.string("lastEmotion"),
        escalation_cooldown_remaining: fields
            .count("escalationCooldownRemaining")
            .unwrap_or_default(),
        apology_count: fields.count("apologyCount").unwrap_or_default(),
        recent_apology_turn_numbers: fields
            .list("recentApologyTurnNumbers", |v| {
                v.as_u64().and_then(|n| u32::try_from(n).ok())
            })
            .unwrap_or_default(),
        de_escalation_blocked: fields.flag("deEscalationBlocked").unwrap_or_default(),
        message_count: fields.count("messageCount").unwrap_or_default(),
        last_message_at: fields.parsed("lastMessageAt", |s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc))
        }),
        point_history: tail(
            fields
                .list("pointHistory", |v| v.as_f64().filter(|n| n.is_finite()))
                .unwrap_or_default(),
            POINT_HISTORY_LEN,
        ),
    };

    let emotional_history = tail(
        fields
            .list("emotionalHistory", history_entry)
            .unwrap_or_default(),
        MAX_EMOTIONAL_HISTORY,
    );

    EmotionState {
        anger,
        current_variant: fields
            .parsed("currentVariant", MoodVariant::parse)
            .unwrap_or_default(),
        emotional_history,
        conversation_ended: fields.flag("conversationEnded").unwrap_or_default(),
    }
}

/// Append one entry, keeping only the newest [`MAX_EMOTIONAL_HISTORY`]
pub fn append_history(
    history: &mut Vec<EmotionalHistoryEntry>,
    emotion: &str,
    intensity: f64,
    variant: MoodVariant,
) {
    history.push(EmotionalHistoryEntry {
        emotion: emotion.to_string(),
        intensity,
        variant,
    });
    if history.len() > MAX_EMOTIONAL_HISTORY {
        let excess = history.len() - MAX_EMOTIONAL_HISTORY;
        history.drain(..excess);
    }
}

/// Summarize the last few entries, e.g. `joy (0.60) → anger (0.80) (escalating)`
pub fn describe_trajectory(history: &[EmotionalHistoryEntry]) -> String {
    if history.is_empty() {
        return "No emotional history yet".to_string();
    }

    let start = history.len().saturating_sub(TRAJECTORY_WINDOW);
    let recent = &history[start..];
    let path = recent
        .iter()
        .map(|e| format!("{} ({:.2})", e.emotion, e.intensity))
        .collect::<Vec<_>>()
        .join(" → ");

    let trend = match recent {
        [.., prev, last] => {
            let change = last.intensity - prev.intensity;
            if change > TREND_THRESHOLD {
                "escalating"
            } else if change < -TREND_THRESHOLD {
                "de-escalating"
            } else {
                "stable"
            }
        }
        _ => "starting point",
    };

    format!("{} ({})", path, trend)
}

fn tail<T>(mut items: Vec<T>, keep: usize) -> Vec<T> {
    if items.len() > keep {
        items.drain(..items.len() - keep);
    }
    items
}

fn history_entry(value: &Value) -> Option<EmotionalHistoryEntry> {
    let obj = value.as_object()?;
    let emotion = obj.get("emotion")?.as_str()?.to_string();
    let intensity = obj.get("intensity")?.as_f64()?.clamp(0.0, 1.0);
    let variant = obj
        .get("variant")
        .and_then(Value::as_str)
        .and_then(MoodVariant::parse)
        .unwrap_or_default();
    Some(EmotionalHistoryEntry {
        emotion,
        intensity,
        variant,
    })
}

/// Typed accessors that log and skip malformed fields
struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn invalid<T>(&self, key: &str) -> Option<T> {
        warn!(field = key, "Invalid emotion state field, using default");
        None
    }

    fn number(&self, key: &str) -> Option<f64> {
        let value = self.get(key)?;
        match value.as_f64().filter(|n| n.is_finite()) {
            Some(n) => Some(n),
            None => self.invalid(key),
        }
    }

    fn count(&self, key: &str) -> Option<u32> {
        let value = self.get(key)?;
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => Some(n),
            None => self.invalid(key),
        }
    }

    fn flag(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => self.invalid(key),
        }
    }

    fn string(&self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => self.invalid(key),
        }
    }

    fn parsed<T>(&self, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let value = self.get(key)?;
        match value.as_str().and_then(parse) {
            Some(v) => Some(v),
            None => self.invalid(key),
        }
    }

    /// Elements that fail `item` are dropped individually
    fn list<T>(&self, key: &str, item: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
        let value = self.get(key)?;
        let Some(items) = value.as_array() else {
            return self.invalid(key);
        };
        let parsed: Vec<T> = items.iter().filter_map(&item).collect();
        if parsed.len() != items.len() {
            warn!(field = key, dropped = items.len() - parsed.len(), "Dropped malformed entries");
        }
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(emotion: &str, intensity: f64) -> EmotionalHistoryEntry {
        EmotionalHistoryEntry {
            emotion: emotion.to_string(),
            intensity,
            variant: MoodVariant::Neutral,
        }
    }

    #[test]
    fn test_missing_and_null_yield_initial() {
        assert_eq!(deserialize(None), create_initial_state());
        assert_eq!(deserialize(Some(&Value::Null)), create_initial_state());
        assert_eq!(deserialize(Some(&json!("garbage"))), create_initial_state());
    }

    #[test]
    fn test_serialized_shape_is_flat_camel_case() {
        let mut state = create_initial_state();
        state.anger.points = 30.0;
        state.anger.level = AngerLevel::Agitated;
        state.current_variant = MoodVariant::Agitated;

        let value = serialize(&state).unwrap();
        assert_eq!(value["points"], json!(30.0));
        assert_eq!(value["level"], json!("agitated"));
        assert_eq!(value["currentVariant"], json!("agitated"));
        assert_eq!(value["consecutiveAngerStreak"], json!(0));
        assert_eq!(value["conversationEnded"], json!(false));
        assert!(value.get("anger").is_none());
    }

    #[test]
    fn test_points_held_to_meter_range() {
        assert_eq!(deserialize(Some(&json!({"points": 250}))).anger.points, 100.0);
        assert_eq!(deserialize(Some(&json!({"points": -12.5}))).anger.points, 0.0);

        let config = AngerConfig {
            max_points: 200.0,
            ..Default::default()
        };
        let state = deserialize_with_config(Some(&json!({"points": 250})), &config);
        assert_eq!(state.anger.points, 200.0);
    }

    #[test]
    fn test_partial_state_defaults_bad_fields() {
        let raw = json!({
            "points": 42.5,
            "level": "furious",
            "apologyCount": -3,
            "recentApologyTurnNumbers": [3, "x", 5],
            "currentVariant": "sad_high",
            "emotionalHistory": [
                {"emotion": "sadness", "intensity": 0.9, "variant": "sad_high"},
                {"emotion": 7}
            ],
            "lastMessageAt": "2026-01-02T03:04:05Z"
        });
        let state = deserialize(Some(&raw));

        assert_eq!(state.anger.points, 42.5);
        assert_eq!(state.anger.level, AngerLevel::Normal);
        assert_eq!(state.anger.apology_count, 0);
        assert_eq!(state.anger.recent_apology_turn_numbers, vec![3, 5]);
        assert_eq!(state.current_variant, MoodVariant::SadHigh);
        assert_eq!(state.emotional_history.len(), 1);
        assert!(state.anger.last_message_at.is_some());
        assert!(!state.conversation_ended);
    }

    #[test]
    fn test_history_window_capped() {
        let mut history = Vec::new();
        for i in 0..8 {
            append_history(&mut history, "joy", f64::from(i) / 10.0, MoodVariant::HappyLow);
        }
        assert_eq!(history.len(), MAX_EMOTIONAL_HISTORY);
        assert!((history[0].intensity - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_trajectory() {
        assert_eq!(describe_trajectory(&[]), "No emotional history yet");
        assert_eq!(
            describe_trajectory(&[entry("joy", 0.6)]),
            "joy (0.60) (starting point)"
        );
        assert_eq!(
            describe_trajectory(&[
                entry("neutral", 0.5),
                entry("joy", 0.6),
                entry("frustration", 0.4),
                entry("anger", 0.9),
            ]),
            "joy (0.60) → frustration (0.40) → anger (0.90) (escalating)"
        );
        assert_eq!(
            describe_trajectory(&[entry("anger", 0.9), entry("anger", 0.5)]),
            "anger (0.90) → anger (0.50) (de-escalating)"
        );
        assert_eq!(
            describe_trajectory(&[entry("joy", 0.5), entry("joy", 0.55)]),
            "joy (0.50) → joy (0.55) (stable)"
        );
    }
}
