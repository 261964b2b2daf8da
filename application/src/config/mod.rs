//! Application-level configuration.
//!
//! [`EngineParams`] holds the history window, collaborator timeouts and
//! narration pacing used by the chat session engine.

pub mod engine_params;

pub use engine_params::{DEFAULT_GREETING, EngineParams};
