//! Port for structured conversation logging.
//!
//! Records the transcript of every scenario (greetings, learner turns,
//! replies, failures, lifecycle changes) to a machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! diagnostics, this port captures what the learner actually saw.

use serde_json::Value;
use tutor_domain::ScenarioId;

/// A structured conversation event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "greeting", "user_message", "assistant_error").
    pub event_type: &'static str,
    /// Scenario the event belongs to
    pub scenario_id: ScenarioId,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, scenario_id: &ScenarioId, payload: Value) -> Self {
        Self {
            event_type,
            scenario_id: scenario_id.clone(),
            payload,
        }
    }
}

/// Port for logging conversation events.
///
/// `log` is synchronous and non-fallible so that logging can never disturb
/// the conversation itself.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
