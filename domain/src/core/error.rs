//! Domain error types

use crate::conversation::message::Channel;
use crate::scenario::entities::ScenarioId;
use thiserror::Error;

/// Caller-contract violations raised by the domain and the session engine.
///
/// Transient I/O failures never show up here: responder failures become
/// in-band error messages and greeting failures fall back to a default text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No active scenario")]
    NoActiveScenario,

    #[error("Unknown scenario: {0}")]
    UnknownScenario(ScenarioId),

    #[error("Wrong channel: expected {expected}, got {actual}")]
    WrongChannel { expected: Channel, actual: Channel },
}

impl DomainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidArgument(message.into())
    }

    /// Check if this error was raised by a channel-specific accessor
    pub fn is_wrong_channel(&self) -> bool {
        matches!(self, DomainError::WrongChannel { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_channel_display() {
        let error = DomainError::WrongChannel {
            expected: Channel::Interaction,
            actual: Channel::Narration,
        };
        assert_eq!(
            error.to_string(),
            "Wrong channel: expected interaction, got narration"
        );
        assert!(error.is_wrong_channel());
    }

    #[test]
    fn test_is_wrong_channel_check() {
        assert!(!DomainError::NoActiveScenario.is_wrong_channel());
        assert!(!DomainError::invalid("empty").is_wrong_channel());
    }
}
