//! Pause / resume / detour / terminate.
//!
//! The engine does not decide when a scenario should be paused or
//! terminated; the navigation layer calls these explicitly.

use super::ChatSessionEngine;
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::session_event::{HistoryChange, SessionEvent};
use tracing::info;
use tutor_domain::{DomainError, Scenario, ScenarioId, ScenarioState};

impl ChatSessionEngine {
    /// Mark a scenario paused. Does not bump the generation.
    pub async fn pause(&self, scenario_id: &ScenarioId) -> Result<(), DomainError> {
        let _op = self.op_lock.lock().await;
        {
            let mut state = self.state.lock().await;
            if !state.set_state(scenario_id, ScenarioState::Paused) {
                return Err(DomainError::UnknownScenario(scenario_id.clone()));
            }
        }
        info!("Scenario {} paused", scenario_id);
        self.emit(SessionEvent::ScenarioPaused {
            scenario_id: scenario_id.clone(),
        });
        Ok(())
    }

    /// Make a previously initialized scenario current again.
    ///
    /// Always bumps the generation and never greets, even if the history was
    /// cleared while the scenario was away.
    pub async fn resume(&self, scenario_id: &ScenarioId) -> Result<(), DomainError> {
        let _op = self.op_lock.lock().await;
        let generation = {
            let mut state = self.state.lock().await;
            if !state.is_known(scenario_id) {
                return Err(DomainError::UnknownScenario(scenario_id.clone()));
            }
            let generation = self.generation.bump();
            state.reactivate(scenario_id);
            generation
        };

        info!(
            "Scenario {} resumed at generation {}",
            scenario_id, generation
        );
        self.emit(SessionEvent::ScenarioActivated {
            scenario_id: scenario_id.clone(),
            generation,
            resumed: true,
        });
        Ok(())
    }

    /// Pause the current scenario (if any) and switch to `scenario`, e.g.
    /// when the learner opens a general chat from inside a lesson.
    ///
    /// Returns the id of the paused scenario.
    pub async fn detour(&self, scenario: Scenario) -> Option<ScenarioId> {
        let _op = self.op_lock.lock().await;
        let paused = {
            let mut state = self.state.lock().await;
            let current = state.current.clone();
            match current {
                Some(id) if &id != scenario.id() => {
                    state.set_state(&id, ScenarioState::Paused);
                    Some(id)
                }
                _ => None,
            }
        };

        if let Some(id) = &paused {
            info!("Scenario {} paused for detour to {}", id, scenario.id());
            self.emit(SessionEvent::ScenarioPaused {
                scenario_id: id.clone(),
            });
        }
        self.enter_scenario(scenario).await;
        paused
    }

    /// Permanently forget a scenario. A later `set_scenario` with the same
    /// value starts from scratch.
    pub async fn terminate(&self, scenario_id: &ScenarioId) -> Result<(), DomainError> {
        let _op = self.op_lock.lock().await;
        {
            let mut state = self.state.lock().await;
            if !state.forget(scenario_id) {
                return Err(DomainError::UnknownScenario(scenario_id.clone()));
            }
        }

        info!("Scenario {} terminated", scenario_id);
        self.emit(SessionEvent::history(scenario_id, HistoryChange::Evicted));
        self.log_event(ConversationEvent::new(
            "scenario_terminated",
            scenario_id,
            serde_json::Value::Null,
        ));
        self.persist(scenario_id).await;
        Ok(())
    }
}
