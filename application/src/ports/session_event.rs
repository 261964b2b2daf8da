//! Session events pushed to subscribers (UI surfaces) for re-rendering.

use tutor_domain::{Generation, MessageId, ScenarioId};

/// What happened to a scenario's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryChange {
    Appended(MessageId),
    /// A streaming message received more content or finished
    Updated(MessageId),
    Removed(MessageId),
    Cleared,
    Evicted,
    /// History seeded from a snapshot with this many messages
    Restored(usize),
}

/// Events emitted by [`ChatSessionEngine`](crate::ChatSessionEngine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A scenario became current
    ScenarioActivated {
        scenario_id: ScenarioId,
        generation: Generation,
        resumed: bool,
    },
    ScenarioPaused { scenario_id: ScenarioId },
    /// History of a scenario changed
    HistoryChanged {
        scenario_id: ScenarioId,
        change: HistoryChange,
    },
}

impl SessionEvent {
    pub fn scenario_id(&self) -> &ScenarioId {
        match self {
            SessionEvent::ScenarioActivated { scenario_id, .. }
            | SessionEvent::ScenarioPaused { scenario_id }
            | SessionEvent::HistoryChanged { scenario_id, .. } => scenario_id,
        }
    }

    pub(crate) fn history(scenario_id: &ScenarioId, change: HistoryChange) -> Self {
        SessionEvent::HistoryChanged {
            scenario_id: scenario_id.clone(),
            change,
        }
    }
}
