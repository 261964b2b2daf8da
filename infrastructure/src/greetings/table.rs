//! Greetings rendered from configured per-character templates.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tutor_application::ports::greeting_provider::{GreetingError, GreetingProvider, GreetingRequest};
use tutor_domain::ScenarioType;

/// Template-based greeting provider.
///
/// `{character}` becomes the character id and `{context}` a readable list of
/// the scenario's context values. Characters without a template use the
/// fallback; without either the provider reports `Unavailable` so the engine
/// uses its default greeting.
#[derive(Debug, Clone, Default)]
pub struct TableGreetingProvider {
    templates: BTreeMap<String, String>,
    fallback: Option<String>,
}

impl TableGreetingProvider {
    pub fn new(templates: BTreeMap<String, String>) -> Self {
        Self {
            templates,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<String>) -> Self {
        self.fallback = fallback.filter(|f| !f.trim().is_empty());
        self
    }

    fn render(template: &str, request: &GreetingRequest) -> String {
        template
            .replace("{character}", &request.character_id)
            .replace("{context}", &describe_context(request))
    }
}

fn describe_context(request: &GreetingRequest) -> String {
    if request.context_keys.is_empty() {
        return match request.scenario_type {
            ScenarioType::General => "anything you like".to_string(),
            ScenarioType::MenuContext => "this topic".to_string(),
            ScenarioType::TaskContext => "this task".to_string(),
        };
    }
    request
        .context_keys
        .iter()
        .map(|(_, value)| value.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl GreetingProvider for TableGreetingProvider {
    async fn greet(&self, request: &GreetingRequest) -> Result<String, GreetingError> {
        let template = self
            .templates
            .get(&request.character_id)
            .or(self.fallback.as_ref())
            .ok_or_else(|| {
                GreetingError::Unavailable(format!("no greeting for {}", request.character_id))
            })?;
        Ok(Self::render(template, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_domain::{Generation, Scenario};

    fn provider() -> TableGreetingProvider {
        let mut templates = BTreeMap::new();
        templates.insert(
            "dr-cell".to_string(),
            "I'm {character}. Today: {context}.".to_string(),
        );
        TableGreetingProvider::new(templates)
    }

    #[tokio::test]
    async fn test_renders_character_template() {
        let scenario = Scenario::menu("dr-cell")
            .unwrap()
            .with_context("topic", "biology")
            .unwrap()
            .with_context("lesson", "mitosis")
            .unwrap();
        let request = GreetingRequest::for_scenario(&scenario, Generation::new(1));

        let greeting = provider().greet(&request).await.unwrap();
        assert_eq!(greeting, "I'm dr-cell. Today: biology, mitosis.");
    }

    #[tokio::test]
    async fn test_empty_context_is_described_by_type() {
        let scenario = Scenario::task("dr-cell").unwrap();
        let request = GreetingRequest::for_scenario(&scenario, Generation::new(1));

        let greeting = provider().greet(&request).await.unwrap();
        assert_eq!(greeting, "I'm dr-cell. Today: this task.");
    }

    #[tokio::test]
    async fn test_unknown_character_uses_fallback_or_fails() {
        let scenario = Scenario::general("ms-ohm").unwrap();
        let request = GreetingRequest::for_scenario(&scenario, Generation::new(1));

        assert!(matches!(
            provider().greet(&request).await,
            Err(GreetingError::Unavailable(_))
        ));

        let greeting = provider()
            .with_fallback(Some("Hello, {character} here!".to_string()))
            .greet(&request)
            .await
            .unwrap();
        assert_eq!(greeting, "Hello, ms-ohm here!");
    }
}
