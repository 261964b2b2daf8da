//! AI Responder port
//!
//! Defines how the session engine asks an external AI for a reply. The
//! engine only reads the returned stream; it never aborts the transport.
//! Dropping a [`ResponseStream`] is the only form of cancellation.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tutor_domain::{Message, ScenarioId};

/// Errors that can occur while obtaining a response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    #[error("Responder timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// An event in a streamed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderEvent {
    /// A text chunk to append to the reply
    Delta(String),
    /// The reply is complete
    Completed,
    /// The responder failed mid-stream
    Error(String),
}

/// Input handed to the responder for one user turn
#[derive(Debug, Clone)]
pub struct ResponderRequest {
    /// The text the learner just submitted
    pub prompt: String,
    /// Most recent settled messages of the scenario, oldest first
    pub history: Vec<Message>,
    /// Persona that should answer
    pub character_id: String,
    pub scenario_id: ScenarioId,
}

/// Handle for receiving streamed response events.
///
/// Wraps an `mpsc::Receiver<ResponderEvent>`; a closed channel without a
/// `Completed` event counts as completion.
pub struct ResponseStream {
    pub receiver: mpsc::Receiver<ResponderEvent>,
}

impl ResponseStream {
    pub fn new(receiver: mpsc::Receiver<ResponderEvent>) -> Self {
        Self { receiver }
    }

    /// Build an already-complete stream from a list of chunks.
    pub fn from_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events: Vec<ResponderEvent> = chunks
            .into_iter()
            .map(|c| ResponderEvent::Delta(c.into()))
            .chain(std::iter::once(ResponderEvent::Completed))
            .collect();
        let (tx, rx) = mpsc::channel(events.len());
        for event in events {
            // Capacity equals the number of events, so this never fails.
            let _ = tx.try_send(event);
        }
        Self::new(rx)
    }

    /// Receive the next event, `None` once the responder hung up.
    pub async fn next_event(&mut self) -> Option<ResponderEvent> {
        self.receiver.recv().await
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, ResponderError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                ResponderEvent::Delta(chunk) => full_text.push_str(&chunk),
                ResponderEvent::Completed => break,
                ResponderEvent::Error(e) => return Err(ResponderError::Transport(e)),
            }
        }
        Ok(full_text)
    }
}

/// External AI that produces character replies
#[async_trait]
pub trait AiResponder: Send + Sync {
    /// Start a streamed reply for one user turn.
    async fn respond(&self, request: ResponderRequest) -> Result<ResponseStream, ResponderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_chunks_collects_in_order() {
        let stream = ResponseStream::from_chunks(["Ice ", "melts ", "at 0°C."]);
        assert_eq!(stream.collect_text().await.unwrap(), "Ice melts at 0°C.");
    }

    #[tokio::test]
    async fn test_collect_text_surfaces_errors() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(ResponderEvent::Delta("partial".to_string())).await.unwrap();
        tx.send(ResponderEvent::Error("reset by peer".to_string())).await.unwrap();
        drop(tx);

        let err = ResponseStream::new(rx).collect_text().await.unwrap_err();
        assert_eq!(err, ResponderError::Transport("reset by peer".to_string()));
    }

    #[tokio::test]
    async fn test_closed_channel_counts_as_completion() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(ResponderEvent::Delta("done".to_string())).await.unwrap();
        drop(tx);
        assert_eq!(ResponseStream::new(rx).collect_text().await.unwrap(), "done");
    }
}
