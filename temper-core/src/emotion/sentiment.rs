//! Sentiment classification of a single utterance
//!
//! The classifier never fails from the caller's point of view: malformed
//! output is retried, and once the attempts run out a neutral judgment is
//! returned so the conversation can continue.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::agent::gateway::{Gateway, GenerationParams};
use crate::agent::message::Message;
use crate::emotion::repair::{extract_json_object, strip_code_fences};
use crate::error::{Error, Result};

const CLASSIFIER_INSTRUCTION: &str = r#"You are a sentiment analysis engine for a roleplay chat.
Classify the emotion expressed by the user's message.
Respond with ONLY a JSON object, no prose and no code fences, in exactly this shape:
{"emotion": "<one lowercase word such as neutral, joy, excitement, gratitude, sadness, grief, disappointment, anger, frustration, irritation, annoyance, rage, fear, surprise>", "intensity": <number from 0.0 to 1.0>, "indicators": ["<words or phrases from the message that support the label>"], "rationale": "<one short sentence>"}"#;

/// Structured judgment for one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentJudgment {
    /// Lowercase emotion label
    pub emotion: String,
    /// Strength of the emotion in `[0, 1]`
    pub intensity: f64,
    /// Phrases from the utterance supporting the label
    pub indicators: Vec<String>,
    /// Short justification, or the failure reason for fallbacks
    pub rationale: String,
}

impl SentimentJudgment {
    /// Build a judgment, clamping intensity and normalising the label
    pub fn new(emotion: impl Into<String>, intensity: f64) -> Self {
        Self {
            emotion: emotion.into().trim().to_lowercase(),
            intensity: clamp_unit(intensity),
            indicators: Vec::new(),
            rationale: String::new(),
        }
    }

    /// The judgment used when classification is impossible
    pub fn neutral_fallback(reason: &str) -> Self {
        Self {
            emotion: "neutral".to_string(),
            intensity: 0.5,
            indicators: Vec::new(),
            rationale: format!("Classification failed, defaulting to neutral: {}", reason),
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Total attempts before falling back to neutral
    pub max_attempts: u32,
    /// Linear backoff step between attempts
    pub backoff_ms: u64,
    /// Sampling temperature for the classification call
    pub temperature: f64,
    /// Token budget for the classification call
    pub max_tokens: u64,
    /// Ask providers for a bare JSON object
    pub json_mode: bool,
    /// Model override for classification
    pub model: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 250,
            temperature: 0.1,
            max_tokens: 200,
            json_mode: true,
            model: None,
        }
    }
}

impl ClassifierConfig {
    fn generation_params(&self) -> GenerationParams {
        let mut params = GenerationParams::new(self.temperature, self.max_tokens);
        params.json_mode = self.json_mode;
        params.model = self.model.clone();
        params
    }
}

/// Parse and validate raw model output into a judgment
///
/// Strips code fences, pulls out the first balanced object, then checks that
/// `emotion` is a non-empty string and `intensity` a number. Missing
/// `indicators`/`rationale` are defaulted.
pub fn parse_judgment(raw: &str) -> Result<SentimentJudgment> {
    let unfenced = strip_code_fences(raw);
    let object = extract_json_object(unfenced)
        .ok_or_else(|| Error::Classification("no JSON object in classifier output".to_string()))?;

    let value: Value = serde_json::from_str(object)
        .map_err(|e| Error::Classification(format!("invalid JSON: {}", e)))?;

    let emotion = value
        .get("emotion")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| Error::Classification("`emotion` must be a non-empty string".to_string()))?;

    let intensity = value
        .get("intensity")
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::Classification("`intensity` must be a number".to_string()))?;

    let indicators = value
        .get("indicators")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let rationale = value
        .get("rationale")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(SentimentJudgment {
        indicators,
        rationale,
        ..SentimentJudgment::new(emotion, intensity)
    })
}

/// Asks the gateway for a judgment of one utterance
pub struct SentimentClassifier {
    gateway: Gateway,
    config: ClassifierConfig,
}

impl SentimentClassifier {
    /// Create a classifier
    pub fn new(gateway: Gateway, config: ClassifierConfig) -> Self {
        Self { gateway, config }
    }

    /// Classifier settings
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify `utterance`; falls back to neutral instead of failing
    #[instrument(skip(self, utterance), fields(chars = utterance.len()))]
    pub async fn classify(&self, utterance: &str) -> SentimentJudgment {
        let messages = vec![
            Message::system(CLASSIFIER_INSTRUCTION),
            Message::user(utterance),
        ];
        let params = self.config.generation_params();
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_failure = String::from("no attempts made");

        for attempt in 1..=max_attempts {
            let outcome = match self.gateway.call(messages.clone(), &params).await {
                Ok(raw) => {
                    debug!(attempt, raw = %raw, "Classifier output");
                    parse_judgment(&raw)
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(judgment) => return judgment,
                // The gateway already declined to retry these
                Err(e) if e.is_gateway_error() && !e.is_retryable() => {
                    warn!(attempt, error = %e, "Sentiment classification refused, using neutral");
                    return SentimentJudgment::neutral_fallback(&e.to_string());
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Sentiment classification attempt failed");
                    last_failure = e.to_string();
                }
            }

            if attempt < max_attempts {
                let delay = Duration::from_millis(self.config.backoff_ms * u64::from(attempt));
                tokio::time::sleep(delay).await;
            }
        }

        warn!(reason = %last_failure, "Sentiment classification exhausted, using neutral");
        SentimentJudgment::neutral_fallback(&last_failure)
    }
}
