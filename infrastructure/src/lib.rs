//! Infrastructure layer for scenario-tutor
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod greetings;
pub mod logging;
pub mod persistence;
pub mod responders;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigLoader, ConfigValidationError, FileConfig, FileReplConfig,
    FileResponderConfig, ResponderKind, Severity,
};
pub use greetings::TableGreetingProvider;
pub use logging::JsonlConversationLogger;
pub use persistence::JsonFileSnapshotStore;
pub use responders::ScriptedResponder;

#[cfg(feature = "http-responder")]
pub use responders::OpenAiCompatibleResponder;
