//! # Temper Core - mood-driven roleplay persona
//!
//! Core types and the per-turn pipeline for a chat persona whose emotional
//! state evolves across a conversation.
//!
//! This crate provides:
//! - Agents (`agent`) - providers, the gateway, prompt composition and the ten mood variants
//! - Emotion (`emotion`) - sentiment classification and the anger meter
//! - Orchestration (`orchestrator`) - routing, walk-away and diagnostics
//! - State (`state`) - the serializable cross-turn emotion state

#![warn(missing_docs)]

pub mod agent;
pub mod emotion;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod prelude;
pub mod state;
