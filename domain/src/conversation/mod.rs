//! Conversation domain.
//!
//! - [`message::Message`]: tagged union of narration and interaction messages
//! - [`store::MessageStore`]: per-scenario in-memory histories
//! - [`narration`]: semantic splitting of narration text into paced segments

pub mod message;
pub mod narration;
pub mod store;
