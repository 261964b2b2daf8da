//! Greeting and snapshot restore on first activation.

use super::ChatSessionEngine;
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::greeting_provider::GreetingRequest;
use crate::ports::session_event::{HistoryChange, SessionEvent};
use tracing::{debug, info, warn};
use tutor_domain::{Generation, NarrationMessage, Scenario, ScenarioId, preview};

impl ChatSessionEngine {
    /// Ask the greeting provider for an opening line and append it if the
    /// generation is still current when it arrives.
    pub(super) async fn request_greeting(&self, scenario: &Scenario, generation: Generation) {
        self.counters.greeting_requested();
        let request = GreetingRequest::for_scenario(scenario, generation);

        let text = match tokio::time::timeout(self.params.greeting_timeout, self.greeter.greet(&request)).await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                warn!("Empty greeting for {}, using default", scenario.id());
                self.params.default_greeting.clone()
            }
            Ok(Err(e)) => {
                warn!("Greeting for {} failed: {}, using default", scenario.id(), e);
                self.params.default_greeting.clone()
            }
            Err(_) => {
                warn!(
                    "Greeting for {} timed out after {}s, using default",
                    scenario.id(),
                    self.params.greeting_timeout.as_secs_f32()
                );
                self.params.default_greeting.clone()
            }
        };

        let scenario_id = scenario.id();
        let appended = {
            let mut state = self.state.lock().await;
            if !self.generation.is_current(generation) {
                None
            } else {
                let message = NarrationMessage::assistant(scenario_id.clone(), text.clone(), generation);
                let message_id = message.base().id();
                state
                    .store
                    .append(scenario_id, message.into())
                    .ok()
                    .map(|_| message_id)
            }
        };

        let Some(message_id) = appended else {
            self.counters.result_discarded();
            debug!(
                "Stale greeting for {} (generation {}) discarded",
                scenario_id, generation
            );
            return;
        };

        self.emit(SessionEvent::history(scenario_id, HistoryChange::Appended(message_id)));
        self.log_event(ConversationEvent::new(
            "greeting",
            scenario_id,
            serde_json::json!({
                "character": scenario.character_id(),
                "generation": generation.value(),
                "text": text,
            }),
        ));
        debug!("Greeting for {}: {}", scenario_id, preview(&text, 80));
        self.persist(scenario_id).await;
    }

    /// Seed a scenario that is new to this engine from the snapshot store.
    ///
    /// Always clears the scenario's restoring mark, re-enabling snapshots.
    pub(super) async fn restore_snapshot(&self, scenario_id: &ScenarioId) {
        let messages = match self.snapshots.restore(scenario_id).await {
            Ok(messages) => messages.unwrap_or_default(),
            Err(e) => {
                warn!("Restoring snapshot of {} failed: {}", scenario_id, e);
                Vec::new()
            }
        };

        let restored = {
            let mut state = self.state.lock().await;
            state.restoring.remove(scenario_id);
            if !messages.is_empty() && state.is_known(scenario_id) && state.store.is_empty(scenario_id) {
                state.store.restore(scenario_id, messages)
            } else {
                0
            }
        };
        if restored > 0 {
            info!("Restored {} messages for scenario {}", restored, scenario_id);
            self.emit(SessionEvent::history(scenario_id, HistoryChange::Restored(restored)));
        }
    }
}
