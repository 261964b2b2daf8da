//! Scenario identity.
//!
//! - [`entities::Scenario`]: character + type + context keys, with a derived id
//! - [`entities::ScenarioId`]: the deterministic id
//! - [`state::ScenarioState`]: lifecycle of a scenario known to the engine

pub mod entities;
pub mod state;
