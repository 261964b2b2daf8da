//! Engine configuration from TOML (`[engine]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tutor_application::EngineParams;
use tutor_domain::SplitConfig;

/// Raw engine configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Prior messages handed to the responder
    pub history_window: usize,
    pub responder_timeout_secs: u64,
    pub greeting_timeout_secs: u64,
    /// Fallback greeting; the built-in one is used when unset
    pub default_greeting: Option<String>,
    pub event_capacity: usize,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        let params = EngineParams::default();
        Self {
            history_window: params.history_window,
            responder_timeout_secs: params.responder_timeout.as_secs(),
            greeting_timeout_secs: params.greeting_timeout.as_secs(),
            default_greeting: None,
            event_capacity: params.event_capacity,
        }
    }
}

impl FileEngineConfig {
    /// Convert into engine parameters using the given narration split.
    pub fn to_engine_params(&self, split: SplitConfig) -> EngineParams {
        let mut params = EngineParams::default()
            .with_history_window(self.history_window)
            .with_responder_timeout(Duration::from_secs(self.responder_timeout_secs))
            .with_greeting_timeout(Duration::from_secs(self.greeting_timeout_secs))
            .with_event_capacity(self.event_capacity)
            .with_split(split);
        if let Some(greeting) = self.default_greeting.as_deref().filter(|g| !g.trim().is_empty()) {
            params = params.with_default_greeting(greeting);
        }
        params
    }
}
