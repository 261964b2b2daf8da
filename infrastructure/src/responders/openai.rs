//! Streaming responder for OpenAI-compatible `/chat/completions` endpoints.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;
use tutor_application::ports::ai_responder::{
    AiResponder, ResponderError, ResponderEvent, ResponderRequest, ResponseStream,
};
use tutor_domain::{Channel, Message, Role};

const DEFAULT_SYSTEM_PROMPT: &str = "You are {character}, a friendly tutor in a learning app. \
Answer briefly and encourage the learner to think for themselves.";

pub struct OpenAiCompatibleResponder {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    system_prompt: String,
}

impl OpenAiCompatibleResponder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Persona prompt; `{character}` is replaced by the character id.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn build_body(&self, request: &ResponderRequest) -> Value {
        let mut messages = vec![json!({
            "role": "system",
            "content": self.system_prompt.replace("{character}", &request.character_id),
        })];
        messages.extend(request.history.iter().map(history_entry));
        messages.push(json!({"role": "user", "content": request.prompt}));

        json!({
            "model": self.model,
            "stream": true,
            "messages": messages,
        })
    }
}

/// Narration is spoken by the character, so it is replayed as assistant text.
fn history_entry(message: &Message) -> Value {
    let role = match (message.channel(), message.role()) {
        (_, Role::User) => "user",
        (Channel::Narration, _) | (_, Role::Assistant) => "assistant",
        (Channel::Interaction, Role::System) => "system",
    };
    json!({"role": role, "content": message.content()})
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// Parse one SSE `data:` payload.
fn parse_sse_data(data: &str) -> Result<Option<ResponderEvent>, ResponderError> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    if data == "[DONE]" {
        return Ok(Some(ResponderEvent::Completed));
    }

    let chunk: CompletionChunk =
        serde_json::from_str(data).map_err(|e| ResponderError::Malformed(e.to_string()))?;
    Ok(chunk
        .choices
        .into_iter()
        .find_map(|choice| choice.delta.content)
        .filter(|text| !text.is_empty())
        .map(ResponderEvent::Delta))
}

#[async_trait]
impl AiResponder for OpenAiCompatibleResponder {
    async fn respond(&self, request: ResponderRequest) -> Result<ResponseStream, ResponderError> {
        let body = self.build_body(&request);

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ResponderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ResponderError::Transport(format!("HTTP {}: {}", status, text)));
        }

        let (tx, rx) = mpsc::channel(64);
        let scenario_id = request.scenario_id;
        tokio::spawn(async move {
            let mut events = response.bytes_stream().eventsource();
            while let Some(event) = events.next().await {
                let outcome = match event {
                    Ok(event) => parse_sse_data(&event.data),
                    Err(e) => Err(ResponderError::Transport(e.to_string())),
                };
                let (event, done) = match outcome {
                    Ok(Some(ResponderEvent::Completed)) => (ResponderEvent::Completed, true),
                    Ok(Some(event)) => (event, false),
                    Ok(None) => continue,
                    Err(e) => (ResponderEvent::Error(e.to_string()), true),
                };
                if tx.send(event).await.is_err() {
                    debug!("Reply stream for {} dropped by reader", scenario_id);
                    return;
                }
                if done {
                    return;
                }
            }
        });

        Ok(ResponseStream::new(rx))
    }
}
