//! Public types returned by the session engine.

use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tutor_domain::Message;

/// Observable counters, mostly useful to tests and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Greeting requests issued to the greeting provider
    pub greeting_requests: u64,
    /// Greetings or responses dropped because their generation went stale
    pub discarded_results: u64,
    /// Responder invocations that ended in an error message
    pub responder_failures: u64,
}

#[derive(Debug, Default)]
pub(super) struct EngineCounters {
    greeting_requests: AtomicU64,
    discarded_results: AtomicU64,
    responder_failures: AtomicU64,
}

impl EngineCounters {
    pub(super) fn greeting_requested(&self) {
        self.greeting_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn result_discarded(&self) {
        self.discarded_results.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn responder_failed(&self) {
        self.responder_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> EngineStats {
        EngineStats {
            greeting_requests: self.greeting_requests.load(Ordering::Relaxed),
            discarded_results: self.discarded_results.load(Ordering::Relaxed),
            responder_failures: self.responder_failures.load(Ordering::Relaxed),
        }
    }
}

/// Assistant messages produced by one submission.
///
/// Yields a snapshot of the streaming reply after every chunk, then the
/// finished reply (or a single error message). Ends without an item when
/// the reply went stale. Dropping the stream does not stop the reply from
/// being recorded in the history.
pub struct MessageStream {
    receiver: mpsc::Receiver<Message>,
}

impl MessageStream {
    pub(super) fn new(receiver: mpsc::Receiver<Message>) -> Self {
        Self { receiver }
    }

    pub async fn next_message(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Drain the stream, returning every yielded message.
    pub async fn collect_messages(mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Some(message) = self.receiver.recv().await {
            messages.push(message);
        }
        messages
    }

    /// Drain the stream, returning only the last message.
    pub async fn final_message(mut self) -> Option<Message> {
        let mut last = None;
        while let Some(message) = self.receiver.recv().await {
            last = Some(message);
        }
        last
    }
}

impl Stream for MessageStream {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
