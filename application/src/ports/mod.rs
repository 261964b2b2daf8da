//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod ai_responder;
pub mod conversation_logger;
pub mod greeting_provider;
pub mod history_snapshot;
pub mod session_event;
