//! The anger meter
//!
//! A persistent point score plus a four-level state machine. Points rise on
//! angry turns and fall on calm ones; the level follows the points through
//! fixed thresholds, subject to these corrections applied in order:
//!
//! 1. the level never rises more than one rank per turn;
//! 2. after a rise, further rises wait out an escalation cooldown;
//! 3. leaving `enraged` requires enough apologies inside a recent window;
//! 4. the level never falls more than one rank per turn.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::emotion::config::{AngerConfig, AngerThresholds};
use crate::emotion::lexicon::{self, LexicalSignals};
use crate::emotion::sentiment::SentimentJudgment;

/// Deltas kept for the debug readout
pub const POINT_HISTORY_LEN: usize = 10;

/// Anger level, ordered from calm to furious
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AngerLevel {
    /// No anger
    #[default]
    Normal,
    /// Mild anger
    Irritated,
    /// Open anger
    Agitated,
    /// Top tier
    Enraged,
}

impl AngerLevel {
    /// Levels by rank
    pub const ALL: [AngerLevel; 4] = [
        AngerLevel::Normal,
        AngerLevel::Irritated,
        AngerLevel::Agitated,
        AngerLevel::Enraged,
    ];

    /// 0 for normal up to 3 for enraged
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Level at `rank`, saturating at enraged
    pub fn from_rank(rank: u8) -> Self {
        Self::ALL[usize::from(rank.min(3))]
    }

    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Irritated => "irritated",
            Self::Agitated => "agitated",
            Self::Enraged => "enraged",
        }
    }

    /// Parse a lowercase name
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|l| l.name() == name)
    }

    /// Level implied by `points` alone
    pub fn from_points(points: f64, thresholds: &AngerThresholds) -> Self {
        if points >= thresholds.enraged {
            Self::Enraged
        } else if points >= thresholds.agitated {
            Self::Agitated
        } else if points >= thresholds.irritated {
            Self::Irritated
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for AngerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Persistent meter state, carried between turns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngerMeterState {
    /// Current score
    pub points: f64,
    /// Current level
    pub level: AngerLevel,
    /// Angry turns in a row
    pub consecutive_anger_streak: u32,
    /// Label of the previous judgment
    pub last_emotion: Option<String>,
    /// Turns left before the level may rise again
    pub escalation_cooldown_remaining: u32,
    /// Apologies since anger last flared
    pub apology_count: u32,
    /// Turn numbers of apologies still inside the window
    pub recent_apology_turn_numbers: Vec<u32>,
    /// Whether the enraged gate held the level on the last turn
    pub de_escalation_blocked: bool,
    /// Turns processed
    pub message_count: u32,
    /// Time of the previous turn, for wall-clock decay
    pub last_message_at: Option<DateTime<Utc>>,
    /// Most recent point deltas
    pub point_history: Vec<f64>,
}

/// Extra readout attached in debug mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngerDebugInfo {
    /// Most recent point deltas, oldest first
    pub point_history: Vec<f64>,
    /// Apologies since anger last flared
    pub apology_count: u32,
    /// Turn numbers of apologies inside the window
    pub recent_apology_turns: Vec<u32>,
    /// Turns left on the escalation cooldown
    pub cooldown_remaining: u32,
    /// Level implied by points before corrections
    pub naive_level: AngerLevel,
}

/// Readout of one processed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngerMeterInfo {
    /// Score after this turn
    pub points: f64,
    /// Ceiling
    pub max_points: f64,
    /// Level after this turn
    pub level: AngerLevel,
    /// Level before this turn
    pub previous_level: AngerLevel,
    /// Signed point change
    pub delta: f64,
    /// Human-readable account of the change
    pub reasons: Vec<String>,
    /// Whether this turn counted as angry
    pub is_angry: bool,
    /// Angry turns in a row
    pub streak: u32,
    /// Turns processed
    pub message_count: u32,
    /// Configured thresholds
    pub thresholds: AngerThresholds,
    /// Whether the enraged gate held the level
    pub de_escalation_blocked: bool,
    /// Apologies inside the window
    pub apologies_in_window: u32,
    /// Apologies needed to leave enraged
    pub apology_requirement: u32,
    /// Lexical signals found in the utterance
    pub signals: LexicalSignals,
    /// Bookkeeping, only in debug mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<AngerDebugInfo>,
}

/// The anger meter for one conversation
#[derive(Debug, Clone)]
pub struct AngerMeter {
    config: Arc<AngerConfig>,
    state: AngerMeterState,
}

impl AngerMeter {
    /// A fresh meter
    pub fn new(config: Arc<AngerConfig>) -> Self {
        Self::from_state(config, AngerMeterState::default())
    }

    /// Resume from persisted state, clamping points into range
    pub fn from_state(config: Arc<AngerConfig>, mut state: AngerMeterState) -> Self {
        state.points = clamp_points(state.points, &config);
        Self { config, state }
    }

    /// Current state
    pub fn state(&self) -> &AngerMeterState {
        &self.state
    }

    /// Consume the meter, returning its state
    pub fn into_state(self) -> AngerMeterState {
        self.state
    }

    /// Meter configuration
    pub fn config(&self) -> &AngerConfig {
        &self.config
    }

    /// Current level
    pub fn level(&self) -> AngerLevel {
        self.state.level
    }

    /// Whether the meter sits at the ceiling while enraged
    pub fn is_maxed_out(&self) -> bool {
        self.state.level == AngerLevel::Enraged && self.state.points >= self.config.max_points
    }

    /// Zero every field
    pub fn reset_meter(&mut self) {
        info!("Anger meter reset");
        self.state = AngerMeterState::default();
        self.state.points = clamp_points(0.0, &self.config);
    }

    /// Process one user turn
    pub fn process(&mut self, utterance: &str, judgment: &SentimentJudgment) -> (AngerLevel, AngerMeterInfo) {
        self.process_at(utterance, judgment, Utc::now())
    }

    /// Process one user turn as if it arrived at `now`
    pub fn process_at(
        &mut self,
        utterance: &str,
        judgment: &SentimentJudgment,
        now: DateTime<Utc>,
    ) -> (AngerLevel, AngerMeterInfo) {
        let config = Arc::clone(&self.config);
        let state = &mut self.state;

        let previous_points = state.points;
        let previous_level = state.level;
        state.message_count += 1;
        let turn = state.message_count;

        let signals = LexicalSignals::detect(utterance);
        let mut points = state.points;
        let mut reasons = Vec::new();

        let idle_since = state.last_message_at.replace(now);

        let emotion = judgment.emotion.trim().to_lowercase();
        let classifier_angry = lexicon::is_anger_emotion(&emotion);
        let lexical_angry = signals.forces_anger();
        let is_angry = classifier_angry || lexical_angry;

        if is_angry {
            let mut intensity = judgment.intensity.clamp(0.0, 1.0);
            if lexical_angry && intensity < config.lexical_intensity_floor {
                intensity = config.lexical_intensity_floor;
            }

            let base = intensity * config.anger_multiplier;
            points += base;
            let label = if classifier_angry { emotion.as_str() } else { "hostile language" };
            reasons.push(format!("+{:.1} {} at intensity {:.2}", base, label, intensity));

            state.consecutive_anger_streak += 1;
            if state.consecutive_anger_streak > 1 {
                points += config.consecutive_anger_bonus;
                reasons.push(format!(
                    "+{:.1} angry {} turns in a row",
                    config.consecutive_anger_bonus, state.consecutive_anger_streak
                ));
            }
            if signals.profanity {
                points += config.profanity_bonus;
                reasons.push(format!("+{:.1} profanity", config.profanity_bonus));
            }
            if signals.insult {
                points += config.insult_bonus;
                reasons.push(format!("+{:.1} direct insult", config.insult_bonus));
            }
            if signals.shouting || signals.exclamations {
                points += config.shouting_bonus;
                reasons.push(format!("+{:.1} shouting", config.shouting_bonus));
            }

            // Renewed anger wipes out progress toward forgiveness
            if state.apology_count > 0 || !state.recent_apology_turn_numbers.is_empty() {
                reasons.push("apology progress reset by renewed anger".to_string());
            }
            state.apology_count = 0;
            state.recent_apology_turn_numbers.clear();
        } else {
            state.consecutive_anger_streak = 0;

            // Wall-clock decay only cools a calm turn
            if let Some(last) = idle_since.filter(|_| config.time_decay_enabled) {
                let minutes = (now - last).num_seconds().max(0) as f64 / 60.0;
                let decay = minutes * config.time_decay_per_minute;
                if decay > 0.0 && points > config.min_points {
                    points -= decay;
                    reasons.push(format!("-{:.1} cooled off over {:.0} idle min", decay, minutes));
                }
            }

            if points > config.min_points {
                points -= config.idle_decay;
                reasons.push(format!("-{:.1} calm turn", config.idle_decay));
            }
            if signals.apology {
                points -= config.apology_penalty;
                state.apology_count += 1;
                state.recent_apology_turn_numbers.push(turn);
                reasons.push(format!("-{:.1} apology", config.apology_penalty));
            }
            if signals.calm {
                points -= config.calm_penalty;
                reasons.push(format!("-{:.1} calm language", config.calm_penalty));
            }
        }

        let window = config.apology_memory_turns;
        state
            .recent_apology_turn_numbers
            .retain(|&t| turn.saturating_sub(t) < window);
        state.last_emotion = Some(emotion);

        points = clamp_points(points, &config);
        state.points = points;

        // Level corrections
        let naive = AngerLevel::from_points(points, &config.thresholds);
        let mut next = naive;

        if next.rank() > previous_level.rank() + 1 {
            next = AngerLevel::from_rank(previous_level.rank() + 1);
            reasons.push(format!("escalation capped at {} (one level per turn)", next));
        }

        if next > previous_level && state.escalation_cooldown_remaining > 0 {
            reasons.push(format!(
                "escalation to {} held by cooldown ({} turn(s) left)",
                next, state.escalation_cooldown_remaining
            ));
            next = previous_level;
        }

        let apologies_in_window = state.recent_apology_turn_numbers.len() as u32;
        state.de_escalation_blocked = false;
        if previous_level == AngerLevel::Enraged && next < AngerLevel::Enraged {
            if apologies_in_window < config.enraged_apology_requirement {
                next = AngerLevel::Enraged;
                state.de_escalation_blocked = true;
                reasons.push(format!(
                    "still enraged: {}/{} recent apologies",
                    apologies_in_window, config.enraged_apology_requirement
                ));
            } else {
                reasons.push(format!(
                    "{} recent apologies accepted, calming down",
                    apologies_in_window
                ));
            }
        }

        if next.rank() + 1 < previous_level.rank() {
            next = AngerLevel::from_rank(previous_level.rank() - 1);
            reasons.push(format!("de-escalation capped at {} (one level per turn)", next));
        }

        if next > previous_level {
            state.escalation_cooldown_remaining = config.escalation_cooldown_turns;
        } else {
            state.escalation_cooldown_remaining = state.escalation_cooldown_remaining.saturating_sub(1);
        }

        if next != previous_level {
            info!(from = %previous_level, to = %next, points, "Anger level changed");
        }
        state.level = next;

        let delta = points - previous_points;
        state.point_history.push(delta);
        if state.point_history.len() > POINT_HISTORY_LEN {
            let excess = state.point_history.len() - POINT_HISTORY_LEN;
            state.point_history.drain(..excess);
        }

        debug!(points, delta, level = %next, is_angry, "Anger meter updated");

        let debug_info = config.debug.then(|| AngerDebugInfo {
            point_history: state.point_history.clone(),
            apology_count: state.apology_count,
            recent_apology_turns: state.recent_apology_turn_numbers.clone(),
            cooldown_remaining: state.escalation_cooldown_remaining,
            naive_level: naive,
        });

        let info = AngerMeterInfo {
            points,
            max_points: config.max_points,
            level: next,
            previous_level,
            delta,
            reasons,
            is_angry,
            streak: state.consecutive_anger_streak,
            message_count: turn,
            thresholds: config.thresholds,
            de_escalation_blocked: state.de_escalation_blocked,
            apologies_in_window,
            apology_requirement: config.enraged_apology_requirement,
            signals,
            debug: debug_info,
        };

        (next, info)
    }
}

pub(crate) fn clamp_points(points: f64, config: &AngerConfig) -> f64 {
    if points.is_nan() {
        return config.min_points;
    }
    points.clamp(config.min_points, config.max_points)
}
