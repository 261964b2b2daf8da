//! Configuration file loading for scenario-tutor
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./tutor.toml` or `./.tutor.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/scenario-tutor/config.toml`
//! 4. Fallback: `~/.config/scenario-tutor/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, ConfigValidationError, FileConfig, FileEngineConfig, FileGreetingsConfig,
    FileLoggingConfig, FileNarrationConfig, FilePersistenceConfig, FileReplConfig,
    FileResponderConfig, ResponderKind, Severity,
};
pub use loader::ConfigLoader;
