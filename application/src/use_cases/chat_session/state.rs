//! Mutable engine state guarded by the engine's mutex.

use std::collections::{HashMap, HashSet};
use tutor_domain::{MessageStore, Scenario, ScenarioId, ScenarioState};

/// A scenario the engine has initialized and not terminated
#[derive(Debug, Clone)]
pub(super) struct ScenarioEntry {
    pub(super) scenario: Scenario,
    pub(super) state: ScenarioState,
}

/// Result of making a scenario current
#[derive(Debug)]
pub(super) struct Activation {
    pub(super) scenario_id: ScenarioId,
    /// The store had no record of the scenario before this activation
    pub(super) is_new: bool,
}

/// Everything the engine mutates. Known scenarios and known store entries
/// are always the same set.
#[derive(Debug, Default)]
pub(super) struct EngineState {
    pub(super) scenarios: HashMap<ScenarioId, ScenarioEntry>,
    pub(super) store: MessageStore,
    pub(super) current: Option<ScenarioId>,
    /// Scenarios whose snapshot restore is in flight; never persisted
    pub(super) restoring: HashSet<ScenarioId>,
}

impl EngineState {
    /// Whether `scenario_id` is current and not paused (re-entry is a no-op).
    pub(super) fn is_active(&self, scenario_id: &ScenarioId) -> bool {
        self.current.as_ref() == Some(scenario_id)
            && self
                .scenarios
                .get(scenario_id)
                .is_some_and(|e| e.state == ScenarioState::Active)
    }

    pub(super) fn is_known(&self, scenario_id: &ScenarioId) -> bool {
        self.scenarios.contains_key(scenario_id)
    }

    pub(super) fn current_entry(&self) -> Option<&ScenarioEntry> {
        self.current.as_ref().and_then(|id| self.scenarios.get(id))
    }

    /// Make `scenario` current, superseding the previous one.
    pub(super) fn activate(&mut self, scenario: Scenario) -> Activation {
        let scenario_id = scenario.id().clone();
        self.supersede_current(&scenario_id);

        let is_new = !self.store.is_known(&scenario_id);
        self.store.register(&scenario_id);
        self.scenarios.insert(
            scenario_id.clone(),
            ScenarioEntry {
                scenario,
                state: ScenarioState::Active,
            },
        );
        self.current = Some(scenario_id.clone());

        Activation { scenario_id, is_new }
    }

    /// Make an already known scenario current again.
    pub(super) fn reactivate(&mut self, scenario_id: &ScenarioId) -> bool {
        if !self.is_known(scenario_id) {
            return false;
        }
        self.supersede_current(scenario_id);
        if let Some(entry) = self.scenarios.get_mut(scenario_id) {
            entry.state = ScenarioState::Active;
        }
        self.current = Some(scenario_id.clone());
        true
    }

    pub(super) fn set_state(&mut self, scenario_id: &ScenarioId, state: ScenarioState) -> bool {
        match self.scenarios.get_mut(scenario_id) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    /// Forget a scenario entirely. Returns whether it was known.
    pub(super) fn forget(&mut self, scenario_id: &ScenarioId) -> bool {
        let known = self.scenarios.remove(scenario_id).is_some();
        self.store.evict(scenario_id);
        self.restoring.remove(scenario_id);
        if self.current.as_ref() == Some(scenario_id) {
            self.current = None;
        }
        known
    }

    fn supersede_current(&mut self, next: &ScenarioId) {
        if let Some(previous) = self.current.take()
            && &previous != next
            && let Some(entry) = self.scenarios.get_mut(&previous)
        {
            entry.state = entry.state.on_superseded();
        }
    }
}
