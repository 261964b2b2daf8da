//! In-memory message store keyed by scenario id.
//!
//! Pure bookkeeping: no I/O, no locking. The session engine owns the only
//! instance and serializes access to it.

use crate::conversation::message::{
    Channel, InteractionMessage, Message, MessageId, NarrationMessage,
};
use crate::core::error::DomainError;
use crate::scenario::entities::ScenarioId;
use std::collections::HashMap;

/// Ordered per-scenario message logs
#[derive(Debug, Default)]
pub struct MessageStore {
    histories: HashMap<ScenarioId, Vec<Message>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a scenario with an empty history. No-op if known.
    pub fn register(&mut self, scenario_id: &ScenarioId) {
        self.histories.entry(scenario_id.clone()).or_default();
    }

    pub fn is_known(&self, scenario_id: &ScenarioId) -> bool {
        self.histories.contains_key(scenario_id)
    }

    /// Seed a known scenario's history, e.g. from a persisted snapshot.
    ///
    /// Messages belonging to another scenario are dropped.
    pub fn restore(&mut self, scenario_id: &ScenarioId, messages: Vec<Message>) -> usize {
        let history = self.histories.entry(scenario_id.clone()).or_default();
        history.clear();
        for mut message in messages {
            if message.scenario_id() != scenario_id {
                continue;
            }
            message.base_mut().finish_streaming();
            history.push(message);
        }
        history.len()
    }

    /// Append a message to a registered scenario.
    ///
    /// The timestamp is raised to the previous message's if needed so that
    /// every history is non-decreasing in time.
    pub fn append(&mut self, scenario_id: &ScenarioId, mut message: Message) -> Result<(), DomainError> {
        if message.scenario_id().is_empty() {
            return Err(DomainError::invalid("message has no owning scenario"));
        }
        if message.scenario_id() != scenario_id {
            return Err(DomainError::invalid(format!(
                "message belongs to {} but was appended to {}",
                message.scenario_id(),
                scenario_id
            )));
        }
        let history = self
            .histories
            .get_mut(scenario_id)
            .ok_or(DomainError::NoActiveScenario)?;

        if let Some(last) = history.last()
            && message.timestamp() < last.timestamp()
        {
            message.base_mut().set_timestamp(last.timestamp());
        }
        history.push(message);
        Ok(())
    }

    /// Channel-checked insertion path for a surface that accepts only `channel`.
    pub fn append_to_channel(
        &mut self,
        channel: Channel,
        scenario_id: &ScenarioId,
        message: Message,
    ) -> Result<(), DomainError> {
        let message = message.expect_channel(channel)?;
        self.append(scenario_id, message)
    }

    /// All messages of a scenario in insertion order; empty when unknown.
    pub fn get_all(&self, scenario_id: &ScenarioId) -> &[Message] {
        self.histories
            .get(scenario_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, scenario_id: &ScenarioId, message_id: MessageId) -> Option<&Message> {
        self.get_all(scenario_id).iter().find(|m| m.id() == message_id)
    }

    pub fn len(&self, scenario_id: &ScenarioId) -> usize {
        self.get_all(scenario_id).len()
    }

    pub fn is_empty(&self, scenario_id: &ScenarioId) -> bool {
        self.len(scenario_id) == 0
    }

    /// Messages filtered to one channel.
    pub fn by_channel(&self, scenario_id: &ScenarioId, channel: Channel) -> Vec<Message> {
        self.get_all(scenario_id)
            .iter()
            .filter(|m| m.channel() == channel)
            .cloned()
            .collect()
    }

    pub fn narration(&self, scenario_id: &ScenarioId) -> Vec<NarrationMessage> {
        self.get_all(scenario_id)
            .iter()
            .filter_map(|m| m.as_narration().cloned())
            .collect()
    }

    pub fn interaction(&self, scenario_id: &ScenarioId) -> Vec<InteractionMessage> {
        self.get_all(scenario_id)
            .iter()
            .filter_map(|m| m.as_interaction().cloned())
            .collect()
    }

    /// The last `window` messages before the end of the history, skipping
    /// error and in-progress messages.
    pub fn recent(&self, scenario_id: &ScenarioId, window: usize) -> Vec<Message> {
        let settled: Vec<&Message> = self
            .get_all(scenario_id)
            .iter()
            .filter(|m| !m.is_error() && !m.is_streaming())
            .collect();
        let skip = settled.len().saturating_sub(window);
        settled.into_iter().skip(skip).cloned().collect()
    }

    /// Append a chunk to a streaming message, returning the updated message.
    ///
    /// Returns `Ok(None)` when the message no longer exists (history was
    /// cleared or the scenario evicted while streaming).
    pub fn update_streaming(
        &mut self,
        scenario_id: &ScenarioId,
        message_id: MessageId,
        chunk: &str,
    ) -> Result<Option<Message>, DomainError> {
        let Some(message) = self.find_mut(scenario_id, message_id) else {
            return Ok(None);
        };
        message.base_mut().push_content(chunk)?;
        Ok(Some(message.clone()))
    }

    /// Freeze a streaming message. `None` when it no longer exists.
    pub fn finish_streaming(&mut self, scenario_id: &ScenarioId, message_id: MessageId) -> Option<Message> {
        let message = self.find_mut(scenario_id, message_id)?;
        message.base_mut().finish_streaming();
        Some(message.clone())
    }

    /// Remove a single message. Returns whether it existed.
    pub fn remove(&mut self, scenario_id: &ScenarioId, message_id: MessageId) -> bool {
        let Some(history) = self.histories.get_mut(scenario_id) else {
            return false;
        };
        let before = history.len();
        history.retain(|m| m.id() != message_id);
        history.len() != before
    }

    /// Drop all messages but keep the scenario known. Idempotent.
    pub fn clear(&mut self, scenario_id: &ScenarioId) {
        if let Some(history) = self.histories.get_mut(scenario_id) {
            history.clear();
        }
    }

    /// Forget the scenario entirely.
    pub fn evict(&mut self, scenario_id: &ScenarioId) -> bool {
        self.histories.remove(scenario_id).is_some()
    }

    fn find_mut(&mut self, scenario_id: &ScenarioId, message_id: MessageId) -> Option<&mut Message> {
        self.histories
            .get_mut(scenario_id)?
            .iter_mut()
            .find(|m| m.id() == message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Generation;
    use crate::scenario::entities::Scenario;

    fn ids() -> (ScenarioId, ScenarioId) {
        (
            Scenario::general("tutor").unwrap().id().clone(),
            Scenario::task("tutor")
                .unwrap()
                .with_context("topic", "atoms")
                .unwrap()
                .id()
                .clone(),
        )
    }

    fn user(id: &ScenarioId, text: &str) -> Message {
        InteractionMessage::user(id.clone(), text, Generation::new(1)).into()
    }

    #[test]
    fn test_append_to_unregistered_scenario_fails() {
        let (a, _) = ids();
        let mut store = MessageStore::new();
        let err = store.append(&a, user(&a, "hi")).unwrap_err();
        assert_eq!(err, DomainError::NoActiveScenario);
    }

    #[test]
    fn test_append_rejects_foreign_message() {
        let (a, b) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        let err = store.append(&a, user(&b, "hi")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert!(store.is_empty(&a));
    }

    #[test]
    fn test_histories_are_isolated() {
        let (a, b) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        store.register(&b);
        store.append(&b, user(&b, "b1")).unwrap();

        for i in 0..5 {
            store.append(&a, user(&a, &format!("a{}", i))).unwrap();
        }

        assert_eq!(store.len(&a), 5);
        let b_history: Vec<_> = store.get_all(&b).iter().map(|m| m.content()).collect();
        assert_eq!(b_history, vec!["b1"]);
    }

    #[test]
    fn test_get_all_unknown_is_empty() {
        let (a, _) = ids();
        let store = MessageStore::new();
        assert!(store.get_all(&a).is_empty());
    }

    #[test]
    fn test_timestamps_are_non_decreasing() {
        let (a, _) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        let older = user(&a, "older");
        let newer = user(&a, "newer");
        store.append(&a, newer).unwrap();
        store.append(&a, older).unwrap();
        let history = store.get_all(&a);
        assert!(history[0].timestamp() <= history[1].timestamp());
    }

    #[test]
    fn test_append_to_channel_enforces_channel() {
        let (a, _) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        let narration: Message = NarrationMessage::system(a.clone(), "Atoms are tiny.", Generation::new(1)).into();

        let err = store
            .append_to_channel(Channel::Interaction, &a, narration.clone())
            .unwrap_err();
        assert!(err.is_wrong_channel());
        assert!(store.is_empty(&a));

        store.append_to_channel(Channel::Narration, &a, narration).unwrap();
        assert_eq!(store.narration(&a).len(), 1);
        assert!(store.interaction(&a).is_empty());
    }

    #[test]
    fn test_clear_keeps_scenario_known_and_evict_forgets() {
        let (a, b) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        store.append(&a, user(&a, "hi")).unwrap();

        store.clear(&a);
        store.clear(&a);
        store.clear(&b);
        assert!(store.is_known(&a));
        assert!(store.is_empty(&a));

        assert!(store.evict(&a));
        assert!(!store.is_known(&a));
        assert!(!store.evict(&a));
    }

    #[test]
    fn test_streaming_update_and_finish() {
        let (a, _) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        let streaming = InteractionMessage::streaming_assistant(a.clone(), Generation::new(1));
        let id = streaming.base().id();
        store.append(&a, streaming.into()).unwrap();

        store.update_streaming(&a, id, "Pro").unwrap();
        let updated = store.update_streaming(&a, id, "tons").unwrap().unwrap();
        assert_eq!(updated.content(), "Protons");
        assert!(updated.is_streaming());

        let done = store.finish_streaming(&a, id).unwrap();
        assert!(!done.is_streaming());
        assert!(store.update_streaming(&a, id, "!").is_err());
    }

    #[test]
    fn test_streaming_update_after_clear_is_none() {
        let (a, _) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        let streaming = InteractionMessage::streaming_assistant(a.clone(), Generation::new(1));
        let id = streaming.base().id();
        store.append(&a, streaming.into()).unwrap();
        store.clear(&a);

        assert_eq!(store.update_streaming(&a, id, "x").unwrap(), None);
        assert!(store.finish_streaming(&a, id).is_none());
    }

    #[test]
    fn test_recent_window_skips_errors() {
        let (a, _) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        for i in 0..4 {
            store.append(&a, user(&a, &format!("m{}", i))).unwrap();
        }
        store
            .append(&a, InteractionMessage::error(a.clone(), "boom", Generation::new(1)).into())
            .unwrap();

        let recent: Vec<_> = store.recent(&a, 2).iter().map(|m| m.content().to_string()).collect();
        assert_eq!(recent, vec!["m2", "m3"]);
    }

    #[test]
    fn test_restore_filters_foreign_messages() {
        let (a, b) = ids();
        let mut store = MessageStore::new();
        let restored = store.restore(&a, vec![user(&a, "mine"), user(&b, "theirs")]);
        assert_eq!(restored, 1);
        assert!(store.is_known(&a));
    }

    #[test]
    fn test_remove_message() {
        let (a, _) = ids();
        let mut store = MessageStore::new();
        store.register(&a);
        let message = user(&a, "oops");
        let id = message.id();
        store.append(&a, message).unwrap();
        assert!(store.remove(&a, id));
        assert!(!store.remove(&a, id));
    }
}
