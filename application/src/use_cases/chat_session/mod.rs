//! Chat session engine
//!
//! Central coordinator of scenario conversations. It decides which scenario
//! is current, keeps every scenario's history isolated, asks the greeting
//! provider and AI responder for content, and drops any asynchronous result
//! whose generation went stale in the meantime.
//!
//! | Operation              | Bumps generation | May greet | Errors                       |
//! |------------------------|------------------|-----------|------------------------------|
//! | `set_scenario`         | unless no-op     | yes       | none                         |
//! | `submit_user_message`  | no               | no        | NoActiveScenario, Invalid    |
//! | `clear_history`        | no               | next entry| none                         |
//! | `terminate`            | no               | next entry| UnknownScenario              |
//! | `pause`                | no               | no        | UnknownScenario              |
//! | `resume`               | yes              | no        | UnknownScenario              |
//!
//! Mutating operations are serialized by the operation lock. `set_scenario`
//! holds it across snapshot restore and the greeting (bounded by
//! `greeting_timeout`), so nothing can land in a history before its greeting.
//! The state mutex only guards single critical sections. Streamed replies run
//! outside both locks, so a scenario switch can overtake an in-flight reply;
//! the generation guard then discards it.

mod greeting;
mod lifecycle;
mod state;
mod submit;
mod types;


pub use types::{EngineStats, MessageStream};

use crate::config::EngineParams;
use crate::ports::ai_responder::AiResponder;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::greeting_provider::GreetingProvider;
use crate::ports::history_snapshot::{HistorySnapshotStore, NoHistorySnapshots};
use crate::ports::session_event::{HistoryChange, SessionEvent};
use state::EngineState;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};
use tutor_domain::{
    Channel, DomainError, Generation, GenerationGuard, InteractionMessage, Message,
    NarrationMessage, Scenario, ScenarioId, ScenarioState, split_narration,
};
use types::EngineCounters;

/// Scenario-aware chat session engine.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct ChatSessionEngine {
    pub(super) responder: Arc<dyn AiResponder>,
    pub(super) greeter: Arc<dyn GreetingProvider>,
    pub(super) snapshots: Arc<dyn HistorySnapshotStore>,
    pub(super) conversation_logger: Arc<dyn ConversationLogger>,
    pub(super) params: Arc<EngineParams>,
    pub(super) state: Arc<Mutex<EngineState>>,
    pub(super) generation: Arc<GenerationGuard>,
    pub(super) events: broadcast::Sender<SessionEvent>,
    pub(super) counters: Arc<EngineCounters>,
    /// Held by every mutating operation for its whole synchronous phase
    pub(super) op_lock: Arc<Mutex<()>>,
    persist_lock: Arc<Mutex<()>>,
}

impl ChatSessionEngine {
    pub fn new(responder: Arc<dyn AiResponder>, greeter: Arc<dyn GreetingProvider>) -> Self {
        let params = EngineParams::default();
        let (events, _) = broadcast::channel(params.event_capacity);
        Self {
            responder,
            greeter,
            snapshots: Arc::new(NoHistorySnapshots),
            conversation_logger: Arc::new(NoConversationLogger),
            params: Arc::new(params),
            state: Arc::new(Mutex::new(EngineState::default())),
            generation: Arc::new(GenerationGuard::new()),
            events,
            counters: Arc::new(EngineCounters::default()),
            op_lock: Arc::new(Mutex::new(())),
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the engine parameters. Call before subscribing.
    pub fn with_params(mut self, params: EngineParams) -> Self {
        let (events, _) = broadcast::channel(params.event_capacity);
        self.events = events;
        self.params = Arc::new(params);
        self
    }

    /// Mirror settled histories into a snapshot store.
    pub fn with_snapshot_store(mut self, store: Arc<dyn HistorySnapshotStore>) -> Self {
        self.snapshots = store;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Subscribe to history and lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn current_generation(&self) -> Generation {
        self.generation.current()
    }

    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }

    // ==================== Scenario switching ====================

    /// Make `scenario` the current conversation context.
    ///
    /// Re-entering the current, non-paused scenario is a no-op. Otherwise the
    /// generation is bumped and, if the scenario's history is empty, exactly
    /// one greeting is requested and awaited. Other mutating calls wait until
    /// the greeting (or its default) is in place.
    pub async fn set_scenario(&self, scenario: Scenario) {
        let _op = self.op_lock.lock().await;
        self.enter_scenario(scenario).await;
    }

    /// `set_scenario` body; the caller holds the operation lock.
    pub(super) async fn enter_scenario(&self, scenario: Scenario) {
        let restore = self.snapshots.is_enabled();
        let (activation, generation) = {
            let mut state = self.state.lock().await;
            if state.is_active(scenario.id()) {
                debug!("Re-entry into active scenario {} ignored", scenario.id());
                return;
            }
            let generation = self.generation.bump();
            let activation = state.activate(scenario.clone());
            if activation.is_new && restore {
                state.restoring.insert(activation.scenario_id.clone());
            }
            (activation, generation)
        };

        info!(
            "Scenario {} activated at generation {}",
            activation.scenario_id, generation
        );
        self.emit(SessionEvent::ScenarioActivated {
            scenario_id: activation.scenario_id.clone(),
            generation,
            resumed: false,
        });

        if activation.is_new && restore {
            self.restore_snapshot(&activation.scenario_id).await;
        }

        let needs_greeting = {
            let state = self.state.lock().await;
            self.generation.is_current(generation) && state.store.is_empty(&activation.scenario_id)
        };
        if needs_greeting {
            self.request_greeting(&scenario, generation).await;
        }
    }

    pub async fn current_scenario(&self) -> Option<Scenario> {
        let state = self.state.lock().await;
        state.current_entry().map(|e| e.scenario.clone())
    }

    /// Lifecycle state of a scenario; `None` if never initialized or terminated.
    pub async fn scenario_state(&self, scenario_id: &ScenarioId) -> Option<ScenarioState> {
        let state = self.state.lock().await;
        state.scenarios.get(scenario_id).map(|e| e.state)
    }

    // ==================== History access ====================

    /// Messages of one scenario in order, optionally limited to one channel.
    pub async fn history(&self, scenario_id: &ScenarioId, channel: Option<Channel>) -> Vec<Message> {
        let state = self.state.lock().await;
        match channel {
            Some(channel) => state.store.by_channel(scenario_id, channel),
            None => state.store.get_all(scenario_id).to_vec(),
        }
    }

    /// Accessor for narration surfaces.
    pub async fn narration_messages(&self, scenario_id: &ScenarioId) -> Vec<NarrationMessage> {
        self.state.lock().await.store.narration(scenario_id)
    }

    /// Accessor for interactive chat surfaces.
    pub async fn interaction_messages(&self, scenario_id: &ScenarioId) -> Vec<InteractionMessage> {
        self.state.lock().await.store.interaction(scenario_id)
    }

    /// Insert a message through a surface that only accepts `channel`.
    pub async fn append_message(&self, channel: Channel, message: Message) -> Result<(), DomainError> {
        let scenario_id = message.scenario_id().clone();
        let message_id = message.id();
        let _op = self.op_lock.lock().await;
        {
            let mut state = self.state.lock().await;
            state.store.append_to_channel(channel, &scenario_id, message)?;
        }
        self.emit(SessionEvent::history(&scenario_id, HistoryChange::Appended(message_id)));
        self.persist(&scenario_id).await;
        Ok(())
    }

    /// Split script text into paced narration and append it to the current
    /// scenario as system narration.
    pub async fn narrate(&self, text: &str) -> Result<Vec<NarrationMessage>, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::invalid("narration text must not be empty"));
        }

        let _op = self.op_lock.lock().await;
        let (scenario_id, appended) = {
            let mut state = self.state.lock().await;
            let scenario_id = state.current.clone().ok_or(DomainError::NoActiveScenario)?;
            let generation = self.generation.current();

            let mut appended = Vec::new();
            for segment in split_narration(text, &self.params.split) {
                let message = NarrationMessage::system(scenario_id.clone(), segment.text, generation)
                    .with_pacing(segment.pacing);
                state.store.append(&scenario_id, message.clone().into())?;
                appended.push(message);
            }
            (scenario_id, appended)
        };

        for message in &appended {
            self.emit(SessionEvent::history(
                &scenario_id,
                HistoryChange::Appended(message.base().id()),
            ));
        }
        self.log_event(ConversationEvent::new(
            "narration",
            &scenario_id,
            serde_json::json!({
                "segments": appended.len(),
                "text": text,
            }),
        ));
        self.persist(&scenario_id).await;
        Ok(appended)
    }

    /// Drop all messages of a scenario, keeping it known.
    ///
    /// The next activation of the scenario greets again. Clearing an unknown
    /// scenario is a no-op.
    pub async fn clear_history(&self, scenario_id: &ScenarioId) {
        let _op = self.op_lock.lock().await;
        let known = {
            let mut state = self.state.lock().await;
            state.store.clear(scenario_id);
            state.is_known(scenario_id)
        };
        if !known {
            return;
        }
        info!("History of scenario {} cleared", scenario_id);
        self.emit(SessionEvent::history(scenario_id, HistoryChange::Cleared));
        self.log_event(ConversationEvent::new(
            "history_cleared",
            scenario_id,
            serde_json::Value::Null,
        ));
        self.persist(scenario_id).await;
    }

    // ==================== Internal helpers ====================

    pub(super) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub(super) fn log_event(&self, event: ConversationEvent) {
        self.conversation_logger.log(event);
    }

    /// Mirror a scenario's settled history into the snapshot store, or
    /// discard its snapshot if the scenario is no longer known.
    ///
    /// Skipped while the scenario's snapshot is being restored, so a
    /// half-built history never replaces the stored one.
    pub(super) async fn persist(&self, scenario_id: &ScenarioId) {
        if !self.snapshots.is_enabled() {
            return;
        }
        let _guard = self.persist_lock.lock().await;

        let messages: Option<Vec<Message>> = {
            let state = self.state.lock().await;
            if state.restoring.contains(scenario_id) {
                debug!("Snapshot of {} deferred until its restore finishes", scenario_id);
                return;
            }
            state.is_known(scenario_id).then(|| {
                state
                    .store
                    .get_all(scenario_id)
                    .iter()
                    .filter(|m| !m.is_streaming())
                    .cloned()
                    .collect()
            })
        };

        let result = match messages {
            Some(messages) => self.snapshots.snapshot(scenario_id, &messages).await,
            None => self.snapshots.discard(scenario_id).await,
        };
        if let Err(e) = result {
            warn!("Snapshot of scenario {} failed: {}", scenario_id, e);
        }
    }
}
