//! Domain layer for scenario-tutor
//!
//! This crate contains the core entities and value objects of the chat
//! session engine. It has no dependencies on infrastructure or presentation
//! concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Scenario
//!
//! An isolated conversation context: which character is speaking, what kind
//! of screen the learner is on, and a few context keys (topic, lesson, task).
//! Its id is derived from those inputs, so re-entering the same context
//! yields the same scenario.
//!
//! ## Channels
//!
//! - **Narration**: system-paced explanation, never awaits a reply
//! - **Interaction**: turns the learner may reply to
//!
//! [`Message`] is a sum type over the two, so a narration message cannot be
//! handed to an interaction-only surface by accident.
//!
//! ## Generation
//!
//! A counter bumped on every scenario switch. Asynchronous results stamped
//! with an older generation are discarded.

pub mod conversation;
pub mod core;
pub mod generation;
pub mod scenario;

// Re-export commonly used types
pub use conversation::{
    message::{
        Channel, InteractionMessage, Message, MessageBase, MessageId, NarrationMessage, PacingHint,
        Role,
    },
    narration::{NarrationSegment, NarrationSegments, SplitConfig, split_narration},
    store::MessageStore,
};
pub use crate::core::{error::DomainError, text::preview};
pub use generation::{Generation, GenerationGuard};
pub use scenario::{
    entities::{Scenario, ScenarioId, ScenarioType},
    state::ScenarioState,
};
