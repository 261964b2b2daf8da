//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! by the composition root.

mod engine;
mod greetings;
mod logging;
mod narration;
mod persistence;
mod repl;
mod responder;

pub use engine::FileEngineConfig;
pub use greetings::FileGreetingsConfig;
pub use logging::FileLoggingConfig;
pub use narration::FileNarrationConfig;
pub use persistence::FilePersistenceConfig;
pub use repl::FileReplConfig;
pub use responder::{FileResponderConfig, ResponderKind};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tutor_application::EngineParams;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    Zero { field: &'static str },

    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("narration.min_display_ms ({min}) exceeds narration.max_display_ms ({max})")]
    DisplayRange { min: u64, max: u64 },

    #[error("greetings.characters.{character}: unknown placeholder in template")]
    UnknownPlaceholder { character: String },

    #[error("responder.kind = \"http\" requires the http-responder feature")]
    HttpResponderUnavailable,
}

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The configuration cannot work at all.
    Error,
    /// The configuration works but may not behave as expected.
    Warning,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub error: ConfigValidationError,
}

impl ConfigIssue {
    fn error(error: ConfigValidationError) -> Self {
        Self {
            severity: Severity::Error,
            error,
        }
    }

    fn warning(error: ConfigValidationError) -> Self {
        Self {
            severity: Severity::Warning,
            error,
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Session engine tuning
    pub engine: FileEngineConfig,
    /// Narration splitting and pacing
    pub narration: FileNarrationConfig,
    /// Per-character greeting templates
    pub greetings: FileGreetingsConfig,
    /// History snapshots
    pub persistence: FilePersistenceConfig,
    /// Conversation transcript
    pub logging: FileLoggingConfig,
    /// AI responder selection
    pub responder: FileResponderConfig,
    /// REPL settings
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (field, value) in [
            ("engine.responder_timeout_secs", self.engine.responder_timeout_secs),
            ("engine.greeting_timeout_secs", self.engine.greeting_timeout_secs),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(ConfigValidationError::Zero { field }));
            }
        }
        if self.engine.event_capacity == 0 {
            issues.push(ConfigIssue::warning(ConfigValidationError::Zero {
                field: "engine.event_capacity",
            }));
        }
        if self.engine.history_window == 0 {
            issues.push(ConfigIssue::warning(ConfigValidationError::Zero {
                field: "engine.history_window",
            }));
        }
        if self
            .engine
            .default_greeting
            .as_deref()
            .is_some_and(|g| g.trim().is_empty())
        {
            issues.push(ConfigIssue::warning(ConfigValidationError::Empty {
                field: "engine.default_greeting",
            }));
        }

        if self.narration.max_words == 0 {
            issues.push(ConfigIssue::warning(ConfigValidationError::Zero {
                field: "narration.max_words",
            }));
        }
        if self.narration.min_display_ms > self.narration.max_display_ms {
            issues.push(ConfigIssue::warning(ConfigValidationError::DisplayRange {
                min: self.narration.min_display_ms,
                max: self.narration.max_display_ms,
            }));
        }

        for (character, template) in &self.greetings.characters {
            if has_unknown_placeholder(template) {
                issues.push(ConfigIssue::warning(ConfigValidationError::UnknownPlaceholder {
                    character: character.clone(),
                }));
            }
        }

        if self.responder.kind == ResponderKind::Http {
            if !cfg!(feature = "http-responder") {
                issues.push(ConfigIssue::error(
                    ConfigValidationError::HttpResponderUnavailable,
                ));
            }
            for (field, value) in [
                ("responder.base_url", &self.responder.base_url),
                ("responder.model", &self.responder.model),
            ] {
                if value.trim().is_empty() {
                    issues.push(ConfigIssue::error(ConfigValidationError::Empty { field }));
                }
            }
        }

        issues
    }

    /// Convert the engine and narration sections into engine parameters.
    pub fn to_engine_params(&self) -> EngineParams {
        self.engine.to_engine_params(self.narration.to_split_config())
    }
}

/// True if the template contains a `{...}` other than the known placeholders.
fn has_unknown_placeholder(template: &str) -> bool {
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            return false;
        };
        let name = &rest[start + 1..start + len];
        if name != "context" && name != "character" {
            return true;
        }
        rest = &rest[start + len + 1..];
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[engine]
history_window = 4
responder_timeout_secs = 20
default_greeting = "Hey there!"

[narration]
max_words = 25
question_gap_ms = 2000

[greetings.characters]
dr-cell = "Welcome to the lab! Today: {context}."

[persistence]
enabled = true
directory = "/tmp/tutor-snapshots"

[logging]
conversation_log = "transcript.jsonl"

[responder]
kind = "http"
model = "tutor-small"

[repl]
honor_pacing = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.history_window, 4);
        assert_eq!(config.engine.responder_timeout_secs, 20);
        assert_eq!(config.narration.max_words, 25);
        assert_eq!(
            config.greetings.characters.get("dr-cell").map(String::as_str),
            Some("Welcome to the lab! Today: {context}.")
        );
        assert!(config.persistence.enabled);
        assert_eq!(config.logging.conversation_log.as_deref(), Some("transcript.jsonl"));
        assert_eq!(config.responder.kind, ResponderKind::Http);
        assert_eq!(config.responder.model, "tutor-small");
        assert!(!config.repl.honor_pacing);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[engine]
greeting_timeout_secs = 3
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.greeting_timeout_secs, 3);
        // Defaults should apply
        assert_eq!(config.engine.history_window, 10);
        assert_eq!(config.responder.kind, ResponderKind::Scripted);
        assert!(!config.persistence.enabled);
        assert!(config.repl.honor_pacing);
    }

    #[test]
    fn test_default_config_matches_engine_defaults() {
        let params = FileConfig::default().to_engine_params();
        let defaults = EngineParams::default();
        assert_eq!(params.history_window, defaults.history_window);
        assert_eq!(params.responder_timeout, defaults.responder_timeout);
        assert_eq!(params.greeting_timeout, defaults.greeting_timeout);
        assert_eq!(params.default_greeting, defaults.default_greeting);
        assert_eq!(params.split, defaults.split);
    }

    #[test]
    fn test_to_engine_params_applies_overrides() {
        let mut config = FileConfig::default();
        config.engine.responder_timeout_secs = 5;
        config.engine.default_greeting = Some("Hey there!".to_string());
        config.narration.question_gap_ms = 2000;

        let params = config.to_engine_params();
        assert_eq!(params.responder_timeout, Duration::from_secs(5));
        assert_eq!(params.default_greeting, "Hey there!");
        assert_eq!(params.split.question_gap, Duration::from_secs(2));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_zero_timeout_is_error() {
        let mut config = FileConfig::default();
        config.engine.responder_timeout_secs = 0;

        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(
            issues[0].error,
            ConfigValidationError::Zero {
                field: "engine.responder_timeout_secs"
            }
        );
    }

    #[test]
    fn test_validate_flags_unknown_placeholder() {
        let mut config = FileConfig::default();
        config
            .greetings
            .characters
            .insert("x".to_string(), "Hi {name}!".to_string());
        config
            .greetings
            .characters
            .insert("y".to_string(), "Hi, I'm {character}. {context}".to_string());

        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].to_string().contains("greetings.characters.x"));
    }

    #[test]
    fn test_validate_display_range() {
        let mut config = FileConfig::default();
        config.narration.min_display_ms = 9000;
        config.narration.max_display_ms = 1000;

        let issues = config.validate();
        assert!(matches!(
            issues[0].error,
            ConfigValidationError::DisplayRange { min: 9000, max: 1000 }
        ));
    }
}
