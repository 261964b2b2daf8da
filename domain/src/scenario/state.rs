//! Per-scenario lifecycle state.
//!
//! `Uninitialized` and `Terminated` are not represented: a scenario the engine
//! does not know about is in one of those two states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a scenario known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    /// The current scenario
    Active,
    /// Suspended for later resumption
    Paused,
    /// Superseded by another scenario; history retained
    Inactive,
}

impl ScenarioState {
    /// State a scenario moves to when another scenario becomes current.
    ///
    /// Paused scenarios stay paused.
    pub fn on_superseded(self) -> Self {
        match self {
            ScenarioState::Paused => ScenarioState::Paused,
            _ => ScenarioState::Inactive,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, ScenarioState::Paused)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioState::Active => "active",
            ScenarioState::Paused => "paused",
            ScenarioState::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superseded_keeps_pause() {
        assert_eq!(ScenarioState::Paused.on_superseded(), ScenarioState::Paused);
        assert_eq!(ScenarioState::Active.on_superseded(), ScenarioState::Inactive);
        assert_eq!(ScenarioState::Inactive.on_superseded(), ScenarioState::Inactive);
    }
}
