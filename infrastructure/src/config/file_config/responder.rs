//! Responder selection from TOML (`[responder]` section)

use serde::{Deserialize, Serialize};

/// Which AI responder backs the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderKind {
    /// Offline, deterministic replies
    #[default]
    Scripted,
    /// OpenAI-compatible chat completions endpoint
    Http,
}

/// Raw responder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileResponderConfig {
    pub kind: ResponderKind,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Persona prompt; `{character}` is substituted
    pub system_prompt: Option<String>,
    /// Canned replies for the scripted responder, used in order
    pub scripted_replies: Vec<String>,
}

impl Default for FileResponderConfig {
    fn default() -> Self {
        Self {
            kind: ResponderKind::Scripted,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            system_prompt: None,
            scripted_replies: Vec::new(),
        }
    }
}
