//! Offline responder that streams canned or echoed replies word by word.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tutor_application::ports::ai_responder::{
    AiResponder, ResponderError, ResponderEvent, ResponderRequest, ResponseStream,
};

/// Deterministic responder for demos and tests.
///
/// With canned replies configured, they are used in order and wrap around.
/// Without any, the character restates the learner's question.
pub struct ScriptedResponder {
    replies: Vec<String>,
    next: Mutex<usize>,
    chunk_delay: Duration,
}

impl ScriptedResponder {
    pub fn new() -> Self {
        Self {
            replies: Vec::new(),
            next: Mutex::new(0),
            chunk_delay: Duration::ZERO,
        }
    }

    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies.into_iter().filter(|r| !r.trim().is_empty()).collect();
        self
    }

    /// Pause between chunks to make streaming visible.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    fn reply_for(&self, request: &ResponderRequest) -> String {
        if self.replies.is_empty() {
            return format!(
                "({}) Good question! You asked: \"{}\". Let's work through it together.",
                request.character_id,
                request.prompt.trim()
            );
        }

        let index = match self.next.lock() {
            Ok(mut next) => {
                let index = *next % self.replies.len();
                *next = next.wrapping_add(1);
                index
            }
            Err(_) => 0,
        };
        self.replies[index].clone()
    }
}

impl Default for ScriptedResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiResponder for ScriptedResponder {
    async fn respond(&self, request: ResponderRequest) -> Result<ResponseStream, ResponderError> {
        let reply = self.reply_for(&request);
        let chunks = word_chunks(&reply);

        if self.chunk_delay.is_zero() {
            return Ok(ResponseStream::from_chunks(chunks));
        }

        let (tx, rx) = mpsc::channel(chunks.len() + 1);
        let delay = self.chunk_delay;
        tokio::spawn(async move {
            for chunk in chunks {
                tokio::time::sleep(delay).await;
                if tx.send(ResponderEvent::Delta(chunk)).await.is_err() {
                    // Reader went away; nothing left to do.
                    return;
                }
            }
            let _ = tx.send(ResponderEvent::Completed).await;
        });
        Ok(ResponseStream::new(rx))
    }
}

/// Split text into words, each keeping its trailing whitespace.
fn word_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if !c.is_whitespace() && current.ends_with(char::is_whitespace) {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_domain::Scenario;

    fn request(prompt: &str) -> ResponderRequest {
        let scenario = Scenario::general("ms-ohm").unwrap();
        ResponderRequest {
            prompt: prompt.to_string(),
            history: Vec::new(),
            character_id: scenario.character_id().to_string(),
            scenario_id: scenario.id().clone(),
        }
    }

    #[test]
    fn test_word_chunks_reassemble() {
        let text = "Current flows  from high\nto low.";
        let chunks = word_chunks(text);
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks[0], "Current ");
        assert_eq!(chunks[1], "flows  ");
        assert_eq!(chunks.len(), 6);
    }

    #[tokio::test]
    async fn test_echo_mentions_prompt_and_character() {
        let responder = ScriptedResponder::new();
        let text = responder
            .respond(request("what is voltage?"))
            .await
            .unwrap()
            .collect_text()
            .await
            .unwrap();
        assert!(text.contains("what is voltage?"));
        assert!(text.starts_with("(ms-ohm)"));
    }

    #[tokio::test]
    async fn test_canned_replies_cycle() {
        let responder =
            ScriptedResponder::new().with_replies(vec!["First.".to_string(), "Second.".to_string()]);

        let mut texts = Vec::new();
        for _ in 0..3 {
            let stream = responder.respond(request("q")).await.unwrap();
            texts.push(stream.collect_text().await.unwrap());
        }
        assert_eq!(texts, vec!["First.", "Second.", "First."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_chunks_arrive_in_order() {
        let responder = ScriptedResponder::new()
            .with_replies(vec!["Ohm's law: V equals I times R.".to_string()])
            .with_chunk_delay(Duration::from_millis(20));

        let text = responder
            .respond(request("q"))
            .await
            .unwrap()
            .collect_text()
            .await
            .unwrap();
        assert_eq!(text, "Ohm's law: V equals I times R.");
    }
}
