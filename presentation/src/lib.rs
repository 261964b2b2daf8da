//! Presentation layer for scenario-tutor
//!
//! This crate contains CLI definitions, output formatters and the
//! interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::{Cli, ScenarioTypeArg};
pub use output::console::ConsoleFormatter;
