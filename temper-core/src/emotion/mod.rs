//! Emotion tracking: sentiment classification and the anger meter

pub mod anger;
pub mod config;
pub mod lexicon;
pub mod repair;
pub mod sentiment;

pub use anger::{AngerDebugInfo, AngerLevel, AngerMeter, AngerMeterInfo, AngerMeterState};
pub use config::{AngerConfig, AngerThresholds};
pub use lexicon::LexicalSignals;
pub use sentiment::{parse_judgment, ClassifierConfig, SentimentClassifier, SentimentJudgment};
