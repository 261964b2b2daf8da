//! Greeting Provider port
//!
//! Supplies the first line a character says when a scenario starts with an
//! empty history. Failures are never shown to the learner: the engine falls
//! back to a static greeting.

use async_trait::async_trait;
use thiserror::Error;
use tutor_domain::{Generation, Scenario, ScenarioType};

/// Errors a greeting provider may report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GreetingError {
    #[error("Greeting unavailable: {0}")]
    Unavailable(String),

    #[error("Greeting timed out")]
    Timeout,
}

/// What the provider needs to phrase a greeting
#[derive(Debug, Clone)]
pub struct GreetingRequest {
    pub character_id: String,
    pub scenario_type: ScenarioType,
    pub context_keys: Vec<(String, String)>,
    /// Generation captured when the greeting was requested
    pub generation: Generation,
}

impl GreetingRequest {
    pub fn for_scenario(scenario: &Scenario, generation: Generation) -> Self {
        Self {
            character_id: scenario.character_id().to_string(),
            scenario_type: scenario.scenario_type(),
            context_keys: scenario.context_keys().to_vec(),
            generation,
        }
    }

    pub fn context(&self, key: &str) -> Option<&str> {
        self.context_keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// External source of greeting text
#[async_trait]
pub trait GreetingProvider: Send + Sync {
    async fn greet(&self, request: &GreetingRequest) -> Result<String, GreetingError>;
}

/// Provider that never has a greeting; the engine's default is always used.
pub struct NoGreetingProvider;

#[async_trait]
impl GreetingProvider for NoGreetingProvider {
    async fn greet(&self, _request: &GreetingRequest) -> Result<String, GreetingError> {
        Err(GreetingError::Unavailable("no greeting provider configured".to_string()))
    }
}
