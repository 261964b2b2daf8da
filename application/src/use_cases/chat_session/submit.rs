//! User turns and streamed replies.

use super::ChatSessionEngine;
use super::types::MessageStream;
use crate::ports::ai_responder::{ResponderError, ResponderEvent, ResponderRequest};
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::session_event::{HistoryChange, SessionEvent};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};
use tutor_domain::{
    DomainError, Generation, InteractionMessage, Message, MessageId, ScenarioId, preview,
};

/// How a responder invocation ended
enum DriveOutcome {
    Completed,
    Stale,
    Failed(ResponderError),
}

/// Result of applying one chunk to the history
enum ChunkOutcome {
    Applied(Message),
    Stale,
}

impl ChatSessionEngine {
    /// Record a learner turn and start streaming the character's reply.
    ///
    /// The user message is appended before this returns. The reply is driven
    /// by a background task, so it is recorded even if the returned stream is
    /// dropped. Responder failures arrive as a single error message.
    pub async fn submit_user_message(&self, text: impl Into<String>) -> Result<MessageStream, DomainError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DomainError::invalid("message text must not be empty"));
        }

        // Released when this returns; the spawned reply runs unlocked.
        let _op = self.op_lock.lock().await;
        let (request, generation, user_message_id) = {
            let mut state = self.state.lock().await;
            let entry = state.current_entry().ok_or(DomainError::NoActiveScenario)?;
            let scenario_id = entry.scenario.id().clone();
            let character_id = entry.scenario.character_id().to_string();

            let generation = self.generation.current();
            let history = state.store.recent(&scenario_id, self.params.history_window);
            let user_message = InteractionMessage::user(scenario_id.clone(), text.clone(), generation);
            let user_message_id = user_message.base().id();
            state.store.append(&scenario_id, user_message.into())?;

            let request = ResponderRequest {
                prompt: text.clone(),
                history,
                character_id,
                scenario_id,
            };
            (request, generation, user_message_id)
        };

        let scenario_id = request.scenario_id.clone();
        self.emit(SessionEvent::history(&scenario_id, HistoryChange::Appended(user_message_id)));
        self.log_event(ConversationEvent::new(
            "user_message",
            &scenario_id,
            serde_json::json!({
                "generation": generation.value(),
                "text": text,
            }),
        ));
        info!("User turn in {}: {}", scenario_id, preview(&text, 100));
        self.persist(&scenario_id).await;

        let (tx, rx) = mpsc::channel(self.params.stream_buffer.max(1));
        let engine = self.clone();
        tokio::spawn(async move {
            engine.run_responder(request, generation, tx).await;
        });

        Ok(MessageStream::new(rx))
    }

    async fn run_responder(&self, request: ResponderRequest, generation: Generation, tx: mpsc::Sender<Message>) {
        let scenario_id = request.scenario_id.clone();
        let mut streaming_id: Option<MessageId> = None;

        let outcome = self
            .drive(request, &scenario_id, generation, &mut streaming_id, &tx)
            .await;

        match outcome {
            DriveOutcome::Completed => match streaming_id {
                Some(message_id) => self.complete_reply(&scenario_id, generation, message_id, &tx).await,
                None => {
                    let error = ResponderError::Malformed("empty response".to_string());
                    self.fail_reply(&scenario_id, generation, None, error, &tx).await
                }
            },
            DriveOutcome::Stale => self.discard_reply(&scenario_id, generation, streaming_id).await,
            DriveOutcome::Failed(error) => {
                self.fail_reply(&scenario_id, generation, streaming_id, error, &tx)
                    .await
            }
        }
    }

    /// Read the responder stream until it ends, fails, times out or goes stale.
    async fn drive(
        &self,
        request: ResponderRequest,
        scenario_id: &ScenarioId,
        generation: Generation,
        streaming_id: &mut Option<MessageId>,
        tx: &mpsc::Sender<Message>,
    ) -> DriveOutcome {
        let deadline = Instant::now() + self.params.responder_timeout;

        let mut stream = match timeout_at(deadline, self.responder.respond(request)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return DriveOutcome::Failed(e),
            Err(_) => return DriveOutcome::Failed(ResponderError::Timeout),
        };

        loop {
            let event = match timeout_at(deadline, stream.next_event()).await {
                Ok(Some(event)) => event,
                Ok(None) => return DriveOutcome::Completed,
                Err(_) => return DriveOutcome::Failed(ResponderError::Timeout),
            };

            match event {
                ResponderEvent::Delta(chunk) if chunk.is_empty() => continue,
                ResponderEvent::Delta(chunk) => {
                    match self.apply_chunk(scenario_id, generation, streaming_id, &chunk).await {
                        ChunkOutcome::Applied(message) => {
                            // The caller may have dropped the stream; the history still updates.
                            let _ = tx.send(message).await;
                        }
                        ChunkOutcome::Stale => return DriveOutcome::Stale,
                    }
                }
                ResponderEvent::Completed => return DriveOutcome::Completed,
                ResponderEvent::Error(e) => return DriveOutcome::Failed(ResponderError::Transport(e)),
            }
        }
    }

    async fn apply_chunk(
        &self,
        scenario_id: &ScenarioId,
        generation: Generation,
        streaming_id: &mut Option<MessageId>,
        chunk: &str,
    ) -> ChunkOutcome {
        let (message, change) = {
            let mut state = self.state.lock().await;
            if !self.generation.is_current(generation) || !state.is_known(scenario_id) {
                return ChunkOutcome::Stale;
            }

            match *streaming_id {
                Some(message_id) => match state.store.update_streaming(scenario_id, message_id, chunk) {
                    Ok(Some(message)) => (message, HistoryChange::Updated(message_id)),
                    // Cleared mid-stream: the reply has nowhere to go.
                    Ok(None) | Err(_) => return ChunkOutcome::Stale,
                },
                None => {
                    let mut message: Message =
                        InteractionMessage::streaming_assistant(scenario_id.clone(), generation).into();
                    if message.base_mut().push_content(chunk).is_err() {
                        return ChunkOutcome::Stale;
                    }
                    let message_id = message.id();
                    if state.store.append(scenario_id, message.clone()).is_err() {
                        return ChunkOutcome::Stale;
                    }
                    *streaming_id = Some(message_id);
                    (message, HistoryChange::Appended(message_id))
                }
            }
        };

        self.emit(SessionEvent::history(scenario_id, change));
        ChunkOutcome::Applied(message)
    }

    async fn complete_reply(
        &self,
        scenario_id: &ScenarioId,
        generation: Generation,
        message_id: MessageId,
        tx: &mpsc::Sender<Message>,
    ) {
        let finished = {
            let mut state = self.state.lock().await;
            if self.generation.is_current(generation) {
                state.store.finish_streaming(scenario_id, message_id)
            } else {
                state.store.remove(scenario_id, message_id);
                None
            }
        };

        let Some(message) = finished else {
            self.counters.result_discarded();
            debug!("Reply in {} went stale before completion", scenario_id);
            self.emit(SessionEvent::history(scenario_id, HistoryChange::Removed(message_id)));
            return;
        };

        self.emit(SessionEvent::history(scenario_id, HistoryChange::Updated(message_id)));
        self.log_event(ConversationEvent::new(
            "assistant_message",
            scenario_id,
            serde_json::json!({
                "generation": generation.value(),
                "bytes": message.content().len(),
                "text": message.content(),
            }),
        ));
        debug!("Reply in {}: {}", scenario_id, preview(message.content(), 100));
        let _ = tx.send(message).await;
        self.persist(scenario_id).await;
    }

    async fn discard_reply(&self, scenario_id: &ScenarioId, generation: Generation, streaming_id: Option<MessageId>) {
        self.counters.result_discarded();
        debug!(
            "Stale reply for {} (generation {}, now {}) discarded",
            scenario_id,
            generation,
            self.generation.current()
        );

        if let Some(message_id) = streaming_id {
            let removed = self.state.lock().await.store.remove(scenario_id, message_id);
            if removed {
                self.emit(SessionEvent::history(scenario_id, HistoryChange::Removed(message_id)));
            }
        }
    }

    /// Replace any partial reply with a single error message.
    async fn fail_reply(
        &self,
        scenario_id: &ScenarioId,
        generation: Generation,
        streaming_id: Option<MessageId>,
        error: ResponderError,
        tx: &mpsc::Sender<Message>,
    ) {
        if !self.generation.is_current(generation) {
            self.discard_reply(scenario_id, generation, streaming_id).await;
            return;
        }

        warn!("Responder failed in {}: {}", scenario_id, error);
        self.counters.responder_failed();

        let error_message: Message =
            InteractionMessage::error(scenario_id.clone(), failure_text(&error), generation).into();
        let error_id = error_message.id();

        let (removed, appended) = {
            let mut state = self.state.lock().await;
            let removed = streaming_id.filter(|id| state.store.remove(scenario_id, *id));
            let appended = self.generation.is_current(generation)
                && state.store.append(scenario_id, error_message.clone()).is_ok();
            (removed, appended)
        };

        if let Some(message_id) = removed {
            self.emit(SessionEvent::history(scenario_id, HistoryChange::Removed(message_id)));
        }
        if !appended {
            return;
        }

        self.emit(SessionEvent::history(scenario_id, HistoryChange::Appended(error_id)));
        self.log_event(ConversationEvent::new(
            "assistant_error",
            scenario_id,
            serde_json::json!({
                "generation": generation.value(),
                "error": error.to_string(),
            }),
        ));
        let _ = tx.send(error_message).await;
        self.persist(scenario_id).await;
    }
}

/// Text shown in place of a reply that could not be produced.
fn failure_text(error: &ResponderError) -> String {
    match error {
        ResponderError::Timeout => {
            "Sorry, I took too long to think about that. Please try asking again.".to_string()
        }
        ResponderError::Transport(_) => {
            "Sorry, I couldn't reach the tutor just now. Please try again.".to_string()
        }
        ResponderError::Malformed(_) | ResponderError::Other(_) => {
            "Sorry, something went wrong with that answer. Please try again.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_text_is_never_empty() {
        for error in [
            ResponderError::Timeout,
            ResponderError::Transport("x".to_string()),
            ResponderError::Malformed("x".to_string()),
            ResponderError::Other("x".to_string()),
        ] {
            assert!(!failure_text(&error).is_empty());
        }
    }
}
