//! Application layer for scenario-tutor
//!
//! This crate contains the chat session engine, the ports it talks to and
//! its configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DEFAULT_GREETING, EngineParams};
pub use ports::{
    ai_responder::{AiResponder, ResponderError, ResponderEvent, ResponderRequest, ResponseStream},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    greeting_provider::{GreetingError, GreetingProvider, GreetingRequest, NoGreetingProvider},
    history_snapshot::{HistorySnapshotStore, NoHistorySnapshots, SnapshotError},
    session_event::{HistoryChange, SessionEvent},
};
pub use use_cases::chat_session::{ChatSessionEngine, EngineStats, MessageStream};
