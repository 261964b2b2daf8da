//! Scenario entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Kind of conversation context a scenario represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    /// Home / free-form chat with a character
    General,
    /// A topic or lesson menu
    MenuContext,
    /// A concrete module or task
    TaskContext,
}

impl ScenarioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::General => "general",
            ScenarioType::MenuContext => "menu",
            ScenarioType::TaskContext => "task",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScenarioType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" | "home" => Ok(ScenarioType::General),
            "menu" | "menu_context" | "topic" => Ok(ScenarioType::MenuContext),
            "task" | "task_context" | "module" => Ok(ScenarioType::TaskContext),
            other => Err(DomainError::invalid(format!(
                "unknown scenario type '{}' (expected general, menu or task)",
                other
            ))),
        }
    }
}

/// Derived identifier of a scenario (Value Object)
///
/// Only produced by [`Scenario::new`], so two scenarios built from the same
/// inputs always carry the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(String);

impl ScenarioId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An isolated conversation context: character plus navigational position.
///
/// Pure data. A context change constructs a new value instead of editing
/// an existing one.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    id: ScenarioId,
    character_id: String,
    scenario_type: ScenarioType,
    context_keys: Vec<(String, String)>,
}

impl Scenario {
    /// Build a scenario and derive its id.
    ///
    /// Context keys keep their order; the same keys in a different order
    /// produce a different scenario.
    pub fn new<K, V>(
        character_id: impl Into<String>,
        scenario_type: ScenarioType,
        context_keys: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, DomainError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let character_id = character_id.into().trim().to_string();
        if character_id.is_empty() {
            return Err(DomainError::invalid("character id must not be empty"));
        }

        let context_keys: Vec<(String, String)> = context_keys
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if context_keys.iter().any(|(k, _)| k.trim().is_empty()) {
            return Err(DomainError::invalid("context key must not be empty"));
        }

        let id = derive_id(&character_id, scenario_type, &context_keys);
        Ok(Self {
            id,
            character_id,
            scenario_type,
            context_keys,
        })
    }

    pub fn general(character_id: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(character_id, ScenarioType::General, Vec::<(String, String)>::new())
    }

    pub fn menu(character_id: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(
            character_id,
            ScenarioType::MenuContext,
            Vec::<(String, String)>::new(),
        )
    }

    pub fn task(character_id: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(
            character_id,
            ScenarioType::TaskContext,
            Vec::<(String, String)>::new(),
        )
    }

    /// Return a new scenario with one more context key appended.
    pub fn with_context(
        self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let mut keys = self.context_keys;
        keys.push((key.into(), value.into()));
        Self::new(self.character_id, self.scenario_type, keys)
    }

    pub fn id(&self) -> &ScenarioId {
        &self.id
    }

    pub fn character_id(&self) -> &str {
        &self.character_id
    }

    pub fn scenario_type(&self) -> ScenarioType {
        self.scenario_type
    }

    pub fn context_keys(&self) -> &[(String, String)] {
        &self.context_keys
    }

    /// Look up a context value by key.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context_keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl PartialEq for Scenario {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Scenario {}

impl Hash for Scenario {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

fn derive_id(character_id: &str, scenario_type: ScenarioType, keys: &[(String, String)]) -> ScenarioId {
    let mut id = format!("{}/{}", escape(character_id), scenario_type.as_str());
    for (key, value) in keys {
        id.push('/');
        id.push_str(&escape(key));
        id.push('=');
        id.push_str(&escape(value));
    }
    ScenarioId(id)
}

// Delimiters inside caller data are percent-encoded so ids cannot collide.
fn escape(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '=' => out.push_str("%3D"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_inputs_derive_same_id() {
        let a = Scenario::task("ms-ohm")
            .and_then(|s| s.with_context("topic", "electricity"))
            .unwrap();
        let b = Scenario::new(
            "ms-ohm",
            ScenarioType::TaskContext,
            vec![("topic", "electricity")],
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id().as_str(), "ms-ohm/task/topic=electricity");
    }

    #[test]
    fn test_type_participates_in_id() {
        let general = Scenario::general("tutor").unwrap();
        let menu = Scenario::menu("tutor").unwrap();
        assert_ne!(general, menu);
    }

    #[test]
    fn test_context_key_order_matters() {
        let a = Scenario::new(
            "tutor",
            ScenarioType::TaskContext,
            vec![("topic", "cells"), ("lesson", "1")],
        )
        .unwrap();
        let b = Scenario::new(
            "tutor",
            ScenarioType::TaskContext,
            vec![("lesson", "1"), ("topic", "cells")],
        )
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_delimiters_are_escaped() {
        let tricky = Scenario::general("a/general").unwrap();
        let plain = Scenario::new("a", ScenarioType::General, vec![("general", "")]);
        assert_eq!(tricky.id().as_str(), "a%2Fgeneral/general");
        assert_ne!(tricky.id(), plain.unwrap().id());
    }

    #[test]
    fn test_empty_character_is_invalid() {
        let err = Scenario::general("   ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_context_key_is_invalid() {
        let err = Scenario::general("tutor")
            .unwrap()
            .with_context("", "x")
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn test_context_lookup() {
        let s = Scenario::menu("tutor")
            .unwrap()
            .with_context("topic", "forces")
            .unwrap();
        assert_eq!(s.context("topic"), Some("forces"));
        assert_eq!(s.context("lesson"), None);
    }

    #[test]
    fn test_scenario_type_from_str() {
        assert_eq!("menu".parse::<ScenarioType>().unwrap(), ScenarioType::MenuContext);
        assert_eq!("Task".parse::<ScenarioType>().unwrap(), ScenarioType::TaskContext);
        assert!("lobby".parse::<ScenarioType>().is_err());
    }
}
