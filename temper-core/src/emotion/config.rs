//! Anger meter configuration
//!
//! Loaded once at startup from YAML. Any failure falls back to the built-in
//! defaults so a missing or broken file never takes the meter down.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Point thresholds for each level above normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngerThresholds {
    /// Points at which the character becomes irritated
    pub irritated: f64,
    /// Points at which the character becomes agitated
    pub agitated: f64,
    /// Points at which the character becomes enraged
    pub enraged: f64,
}

impl Default for AngerThresholds {
    fn default() -> Self {
        Self {
            irritated: 12.0,
            agitated: 25.0,
            enraged: 50.0,
        }
    }
}

/// Numeric rules of the anger meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngerConfig {
    /// Points per unit of classifier intensity on an angry turn
    pub anger_multiplier: f64,
    /// Level thresholds
    pub thresholds: AngerThresholds,
    /// Point ceiling
    pub max_points: f64,
    /// Point floor
    pub min_points: f64,
    /// Points removed on every non-angry turn
    pub idle_decay: f64,
    /// Also decay by wall-clock time between messages
    pub time_decay_enabled: bool,
    /// Points removed per idle minute when time decay is on
    pub time_decay_per_minute: f64,
    /// Bonus for each angry turn after the first in a row
    pub consecutive_anger_bonus: f64,
    /// Bonus when the utterance swears
    pub profanity_bonus: f64,
    /// Bonus when the utterance insults the character
    pub insult_bonus: f64,
    /// Bonus for shouting or strings of exclamation marks
    pub shouting_bonus: f64,
    /// Points removed for an apology
    pub apology_penalty: f64,
    /// Points removed for calm or friendly language
    pub calm_penalty: f64,
    /// Turns during which the level may not rise again after rising
    pub escalation_cooldown_turns: u32,
    /// Apologies needed inside the window to leave enraged
    pub enraged_apology_requirement: u32,
    /// Width of the apology window in turns
    pub apology_memory_turns: u32,
    /// Minimum intensity when lexical hostility forces a turn angry
    pub lexical_intensity_floor: f64,
    /// Attach point history and apology bookkeeping to the meter readout
    pub debug: bool,
}

impl Default for AngerConfig {
    fn default() -> Self {
        Self {
            anger_multiplier: 15.0,
            thresholds: AngerThresholds::default(),
            max_points: 100.0,
            min_points: 0.0,
            idle_decay: 2.0,
            time_decay_enabled: false,
            time_decay_per_minute: 0.5,
            consecutive_anger_bonus: 3.0,
            profanity_bonus: 8.0,
            insult_bonus: 10.0,
            shouting_bonus: 2.0,
            apology_penalty: 10.0,
            calm_penalty: 5.0,
            escalation_cooldown_turns: 1,
            enraged_apology_requirement: 2,
            apology_memory_turns: 5,
            lexical_intensity_floor: 0.7,
            debug: false,
        }
    }
}

impl AngerConfig {
    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(self.min_points < t.irritated && t.irritated < t.agitated && t.agitated < t.enraged) {
            return Err(Error::config_load(format!(
                "thresholds must increase strictly above the floor: {} < {} < {} < {}",
                self.min_points, t.irritated, t.agitated, t.enraged
            )));
        }
        if t.enraged > self.max_points {
            return Err(Error::config_load(format!(
                "enraged threshold {} exceeds max_points {}",
                t.enraged, self.max_points
            )));
        }
        if self.anger_multiplier < 0.0 || !self.anger_multiplier.is_finite() {
            return Err(Error::config_load("anger_multiplier must be a finite, non-negative number"));
        }
        if !(0.0..=1.0).contains(&self.lexical_intensity_floor) {
            return Err(Error::config_load("lexical_intensity_floor must be within [0, 1]"));
        }
        Ok(())
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| Error::config_load(format!("invalid anger config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// Load from a YAML file, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded anger config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Anger config unavailable, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AngerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thresholds.irritated, 12.0);
        assert_eq!(config.enraged_apology_requirement, 2);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AngerConfig::from_yaml_str(
            "anger_multiplier: 20\nthresholds:\n  enraged: 60\ndebug: true\n",
        )
        .unwrap();
        assert_eq!(config.anger_multiplier, 20.0);
        assert_eq!(config.thresholds.enraged, 60.0);
        assert_eq!(config.thresholds.irritated, 12.0);
        assert!(config.debug);
        assert_eq!(config.max_points, 100.0);
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let err = AngerConfig::from_yaml_str("thresholds:\n  irritated: 30\n  agitated: 20\n");
        assert!(matches!(err, Err(Error::ConfigLoad(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "apology_memory_turns: 8").unwrap();
        let config = AngerConfig::load(file.path()).unwrap();
        assert_eq!(config.apology_memory_turns, 8);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = AngerConfig::load_or_default("/definitely/not/here/anger.yaml");
        assert_eq!(config, AngerConfig::default());
    }

    #[test]
    fn test_broken_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "anger_multiplier: [not, a, number]").unwrap();
        assert_eq!(AngerConfig::load_or_default(file.path()), AngerConfig::default());
    }
}
