//! History snapshots from TOML (`[persistence]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw persistence configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePersistenceConfig {
    pub enabled: bool,
    /// Snapshot directory; defaults to the platform data dir
    pub directory: Option<String>,
}

impl FilePersistenceConfig {
    /// Directory snapshots are written to, if persistence is enabled.
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        match &self.directory {
            Some(dir) => Some(PathBuf::from(dir)),
            None => dirs::data_dir().map(|d| d.join("scenario-tutor").join("snapshots")),
        }
    }
}
