//! Engine parameters for session engine tuning.
//!
//! [`EngineParams`] groups the static knobs of
//! [`ChatSessionEngine`](crate::ChatSessionEngine): how much history the
//! responder sees, how long collaborators may take, and how narration is
//! paced. These are application-layer concerns, not domain policy.

use std::time::Duration;
use tutor_domain::SplitConfig;

/// Greeting shown when the greeting provider fails or times out.
pub const DEFAULT_GREETING: &str = "Hi! I'm here to help. What would you like to explore today?";

/// Session engine parameters.
#[derive(Debug, Clone)]
pub struct EngineParams {
    /// Number of prior messages handed to the responder. Older turns are
    /// dropped from the responder's context, not from the history.
    pub history_window: usize,
    /// Upper bound on one responder invocation, stream included.
    pub responder_timeout: Duration,
    /// Upper bound on one greeting request.
    pub greeting_timeout: Duration,
    /// Fallback greeting text.
    pub default_greeting: String,
    /// Capacity of the session event broadcast channel.
    pub event_capacity: usize,
    /// Buffer of the per-submission message stream.
    pub stream_buffer: usize,
    /// Narration splitting and pacing.
    pub split: SplitConfig,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            history_window: 10,
            responder_timeout: Duration::from_secs(30),
            greeting_timeout: Duration::from_secs(10),
            default_greeting: DEFAULT_GREETING.to_string(),
            event_capacity: 256,
            stream_buffer: 32,
            split: SplitConfig::default(),
        }
    }
}

impl EngineParams {
    // ==================== Builder Methods ====================

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_responder_timeout(mut self, timeout: Duration) -> Self {
        self.responder_timeout = timeout;
        self
    }

    pub fn with_greeting_timeout(mut self, timeout: Duration) -> Self {
        self.greeting_timeout = timeout;
        self
    }

    pub fn with_default_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.default_greeting = greeting.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }
}
