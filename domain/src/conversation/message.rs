//! Message entities and channel separation.
//!
//! A [`Message`] is a tagged union of [`NarrationMessage`] and
//! [`InteractionMessage`]. Both share a [`MessageBase`]; only the variant
//! decides which surface may display it, and the variants can only be built
//! through their own constructors.

use crate::core::error::DomainError;
use crate::generation::Generation;
use crate::scenario::entities::ScenarioId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Which surface a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// System-paced, no reply expected
    Narration,
    /// Eligible for a user reply
    Interaction,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Narration => "narration",
            Channel::Interaction => "interaction",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unique identifier of a single message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display pacing attached to a narration message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingHint {
    /// How long the segment should stay on screen
    #[serde(with = "duration_ms")]
    pub display_duration: Duration,
    /// Pause before the next segment is shown
    #[serde(with = "duration_ms")]
    pub gap_after: Duration,
}

/// Fields shared by both message variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBase {
    id: MessageId,
    scenario_id: ScenarioId,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    is_streaming: bool,
    is_error: bool,
    generation: Generation,
}

impl MessageBase {
    fn new(
        scenario_id: ScenarioId,
        role: Role,
        content: impl Into<String>,
        generation: Generation,
    ) -> Self {
        Self {
            id: MessageId::new(),
            scenario_id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_streaming: false,
            is_error: false,
            generation,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn scenario_id(&self) -> &ScenarioId {
        &self.scenario_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Append a streamed chunk. Only allowed while the message is streaming.
    pub fn push_content(&mut self, chunk: &str) -> Result<(), DomainError> {
        if !self.is_streaming {
            return Err(DomainError::invalid(format!(
                "message {} is no longer streaming",
                self.id
            )));
        }
        self.content.push_str(chunk);
        Ok(())
    }

    /// Freeze the content. Idempotent.
    pub fn finish_streaming(&mut self) {
        self.is_streaming = false;
    }

    pub(crate) fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }
}

/// A system-paced message; never expects a reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationMessage {
    #[serde(flatten)]
    base: MessageBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pacing: Option<PacingHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media: Option<String>,
}

impl NarrationMessage {
    /// Narration spoken by the character (e.g. a greeting).
    pub fn assistant(
        scenario_id: ScenarioId,
        content: impl Into<String>,
        generation: Generation,
    ) -> Self {
        Self {
            base: MessageBase::new(scenario_id, Role::Assistant, content, generation),
            pacing: None,
            media: None,
        }
    }

    /// Narration supplied by the content provider (script text).
    pub fn system(scenario_id: ScenarioId, content: impl Into<String>, generation: Generation) -> Self {
        Self {
            base: MessageBase::new(scenario_id, Role::System, content, generation),
            pacing: None,
            media: None,
        }
    }

    pub fn with_pacing(mut self, pacing: PacingHint) -> Self {
        self.pacing = Some(pacing);
        self
    }

    /// Attach a reference to accompanying media (image, animation, ...).
    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }

    pub fn base(&self) -> &MessageBase {
        &self.base
    }

    pub fn pacing(&self) -> Option<&PacingHint> {
        self.pacing.as_ref()
    }

    pub fn media(&self) -> Option<&str> {
        self.media.as_deref()
    }
}

/// A message on the reply-eligible surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMessage {
    #[serde(flatten)]
    base: MessageBase,
}

impl InteractionMessage {
    pub fn user(scenario_id: ScenarioId, content: impl Into<String>, generation: Generation) -> Self {
        Self {
            base: MessageBase::new(scenario_id, Role::User, content, generation),
        }
    }

    pub fn assistant(
        scenario_id: ScenarioId,
        content: impl Into<String>,
        generation: Generation,
    ) -> Self {
        Self {
            base: MessageBase::new(scenario_id, Role::Assistant, content, generation),
        }
    }

    /// An empty assistant message that will receive streamed chunks.
    pub fn streaming_assistant(scenario_id: ScenarioId, generation: Generation) -> Self {
        let mut base = MessageBase::new(scenario_id, Role::Assistant, String::new(), generation);
        base.is_streaming = true;
        Self { base }
    }

    /// An assistant message standing in for a failed operation.
    pub fn error(scenario_id: ScenarioId, content: impl Into<String>, generation: Generation) -> Self {
        let mut base = MessageBase::new(scenario_id, Role::Assistant, content, generation);
        base.is_error = true;
        Self { base }
    }

    pub fn base(&self) -> &MessageBase {
        &self.base
    }
}

/// A single turn in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum Message {
    Narration(NarrationMessage),
    Interaction(InteractionMessage),
}

impl Message {
    pub fn channel(&self) -> Channel {
        match self {
            Message::Narration(_) => Channel::Narration,
            Message::Interaction(_) => Channel::Interaction,
        }
    }

    pub fn base(&self) -> &MessageBase {
        match self {
            Message::Narration(m) => &m.base,
            Message::Interaction(m) => &m.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut MessageBase {
        match self {
            Message::Narration(m) => &mut m.base,
            Message::Interaction(m) => &mut m.base,
        }
    }

    pub fn id(&self) -> MessageId {
        self.base().id()
    }

    pub fn scenario_id(&self) -> &ScenarioId {
        self.base().scenario_id()
    }

    pub fn role(&self) -> Role {
        self.base().role()
    }

    pub fn content(&self) -> &str {
        self.base().content()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.base().timestamp()
    }

    pub fn is_streaming(&self) -> bool {
        self.base().is_streaming()
    }

    pub fn is_error(&self) -> bool {
        self.base().is_error()
    }

    pub fn generation(&self) -> Generation {
        self.base().generation()
    }

    pub fn as_narration(&self) -> Option<&NarrationMessage> {
        match self {
            Message::Narration(m) => Some(m),
            Message::Interaction(_) => None,
        }
    }

    pub fn as_interaction(&self) -> Option<&InteractionMessage> {
        match self {
            Message::Interaction(m) => Some(m),
            Message::Narration(_) => None,
        }
    }

    /// Pass the message through only if it belongs to `expected`.
    pub fn expect_channel(self, expected: Channel) -> Result<Self, DomainError> {
        let actual = self.channel();
        if actual != expected {
            return Err(DomainError::WrongChannel { expected, actual });
        }
        Ok(self)
    }
}

impl From<NarrationMessage> for Message {
    fn from(message: NarrationMessage) -> Self {
        Message::Narration(message)
    }
}

impl From<InteractionMessage> for Message {
    fn from(message: InteractionMessage) -> Self {
        Message::Interaction(message)
    }
}

impl TryFrom<Message> for NarrationMessage {
    type Error = DomainError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        match message {
            Message::Narration(m) => Ok(m),
            Message::Interaction(_) => Err(DomainError::WrongChannel {
                expected: Channel::Narration,
                actual: Channel::Interaction,
            }),
        }
    }
}

impl TryFrom<Message> for InteractionMessage {
    type Error = DomainError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        match message {
            Message::Interaction(m) => Ok(m),
            Message::Narration(_) => Err(DomainError::WrongChannel {
                expected: Channel::Interaction,
                actual: Channel::Narration,
            }),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::entities::Scenario;

    fn scenario_id() -> ScenarioId {
        Scenario::general("tutor").unwrap().id().clone()
    }

    #[test]
    fn test_variants_report_their_channel() {
        let narration: Message = NarrationMessage::assistant(scenario_id(), "hi", Generation::new(1)).into();
        let interaction: Message = InteractionMessage::user(scenario_id(), "hello", Generation::new(1)).into();
        assert_eq!(narration.channel(), Channel::Narration);
        assert_eq!(interaction.channel(), Channel::Interaction);
        assert_eq!(narration.role(), Role::Assistant);
        assert_eq!(interaction.role(), Role::User);
    }

    #[test]
    fn test_try_from_wrong_variant_is_wrong_channel() {
        let narration: Message = NarrationMessage::system(scenario_id(), "The water cycle.", Generation::new(0)).into();
        let err = InteractionMessage::try_from(narration).unwrap_err();
        assert_eq!(
            err,
            DomainError::WrongChannel {
                expected: Channel::Interaction,
                actual: Channel::Narration,
            }
        );
    }

    #[test]
    fn test_expect_channel() {
        let message: Message = InteractionMessage::user(scenario_id(), "hello", Generation::new(0)).into();
        assert!(message.clone().expect_channel(Channel::Interaction).is_ok());
        assert!(message.expect_channel(Channel::Narration).unwrap_err().is_wrong_channel());
    }

    #[test]
    fn test_streaming_content_is_frozen_after_finish() {
        let mut message = InteractionMessage::streaming_assistant(scenario_id(), Generation::new(2));
        assert!(message.base().is_streaming());
        message.base.push_content("Evapo").unwrap();
        message.base.push_content("ration").unwrap();
        message.base.finish_streaming();
        assert_eq!(message.base().content(), "Evaporation");
        assert!(message.base.push_content("!").is_err());
    }

    #[test]
    fn test_non_streaming_message_rejects_chunks() {
        let mut message: Message = InteractionMessage::user(scenario_id(), "hi", Generation::new(0)).into();
        assert!(message.base_mut().push_content(" there").is_err());
        assert_eq!(message.content(), "hi");
    }

    #[test]
    fn test_error_message_flags() {
        let message = InteractionMessage::error(scenario_id(), "timed out", Generation::new(3));
        assert!(message.base().is_error());
        assert!(!message.base().is_streaming());
        assert_eq!(message.base().role(), Role::Assistant);
    }

    #[test]
    fn test_serde_keeps_channel_tag_and_pacing() {
        let message: Message = NarrationMessage::system(scenario_id(), "Plants make food.", Generation::new(4))
            .with_pacing(PacingHint {
                display_duration: Duration::from_millis(1500),
                gap_after: Duration::from_millis(400),
            })
            .with_media("img/photosynthesis.png")
            .into();

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["channel"], "narration");
        assert_eq!(json["role"], "system");
        assert_eq!(json["pacing"]["display_duration"], 1500);

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, message);
    }
}
