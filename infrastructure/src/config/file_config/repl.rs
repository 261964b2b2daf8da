//! REPL configuration from TOML (`[repl]` section)

use serde::{Deserialize, Serialize};

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Wait out narration pacing hints when printing narration
    pub honor_pacing: bool,
    /// Path to history file
    pub history_file: Option<String>,
    /// Character used when the session starts
    pub character: String,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            honor_pacing: true,
            history_file: None,
            character: "tutor".to_string(),
        }
    }
}
