//! Per-turn diagnostics describing the orchestrator's reasoning

use serde::{Deserialize, Serialize};

use crate::agent::variant::MoodVariant;
use crate::emotion::anger::AngerMeterInfo;
use crate::emotion::sentiment::SentimentJudgment;
use crate::orchestrator::routing::{RoutingAction, RoutingDecision};
use crate::state::{describe_trajectory, EmotionalHistoryEntry};

/// Everything the orchestrator knows about why a turn went the way it did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnInsights {
    /// Classifier output; absent when the turn was short-circuited
    pub sentiment: Option<SentimentJudgment>,
    /// Routing decision
    pub routing: RoutingDecision,
    /// Narrative diagnostics
    pub diagnostics: Diagnostics,
    /// Anger meter readout; absent when the turn was short-circuited
    pub anger: Option<AngerMeterInfo>,
}

/// Human-readable account of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Bucketed intensity, e.g. "moderate"
    pub intensity_description: String,
    /// Recent emotional path with trend suffix
    pub trajectory: String,
    /// Sentence describing the variant change
    pub state_transition: String,
    /// How the chosen variant should come across
    pub suggestion: String,
    /// Whether the reply said goodbye
    pub goodbye_detected: bool,
}

/// Bucket an intensity into words
pub fn describe_intensity(intensity: f64) -> &'static str {
    if intensity < 0.2 {
        "minimal"
    } else if intensity < 0.4 {
        "subtle"
    } else if intensity < 0.6 {
        "mild"
    } else if intensity < 0.8 {
        "moderate"
    } else {
        "very strong"
    }
}

fn state_transition(routing: &RoutingDecision) -> String {
    let (from, to) = (routing.current_variant, routing.next_variant);
    match routing.action {
        RoutingAction::WalkAway => format!("{} → conversation over (walked away)", from),
        RoutingAction::ConversationEnded => "Conversation over; state unchanged".to_string(),
        _ if from == to => format!("Holding steady at {}", to),
        _ => format!("Shifting from {} to {}", from, to),
    }
}

fn suggestion(next: MoodVariant, action: RoutingAction) -> String {
    match action {
        RoutingAction::WalkAway | RoutingAction::ConversationEnded => {
            "The character has left; start a new conversation to continue".to_string()
        }
        _ => format!("Respond as someone {}", next.description()),
    }
}

/// Assemble the diagnostics for a completed turn
pub fn build_diagnostics(
    judgment: &SentimentJudgment,
    routing: &RoutingDecision,
    history: &[EmotionalHistoryEntry],
    goodbye_detected: bool,
) -> Diagnostics {
    Diagnostics {
        intensity_description: format!(
            "{} {}",
            describe_intensity(judgment.intensity),
            judgment.emotion
        ),
        trajectory: describe_trajectory(history),
        state_transition: state_transition(routing),
        suggestion: suggestion(routing.next_variant, routing.action),
        goodbye_detected,
    }
}

/// Diagnostics for a turn that was never processed
pub fn ended_diagnostics(routing: &RoutingDecision, history: &[EmotionalHistoryEntry]) -> Diagnostics {
    Diagnostics {
        intensity_description: "none".to_string(),
        trajectory: describe_trajectory(history),
        state_transition: state_transition(routing),
        suggestion: suggestion(routing.next_variant, routing.action),
        goodbye_detected: false,
    }
}
