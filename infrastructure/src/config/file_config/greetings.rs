//! Greeting table from TOML (`[greetings]` section)
//!
//! ```toml
//! [greetings]
//! fallback = "Hello! Ready when you are."
//!
//! [greetings.characters]
//! dr-cell = "Welcome to the lab! Today we look at {context}."
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw greeting templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGreetingsConfig {
    /// Template used for characters without an entry
    pub fallback: Option<String>,
    /// Character id to template; `{context}` and `{character}` are substituted
    pub characters: BTreeMap<String, String>,
}
