//! Interactive chat module
//!
//! Provides a readline-based interactive interface to the session engine.

mod repl;

pub use repl::{ChatRepl, HistoryView, ReplCommand, ScenarioSpec};
