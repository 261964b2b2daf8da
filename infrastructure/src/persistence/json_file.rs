//! One JSON file per scenario, written atomically via rename.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use tutor_application::ports::history_snapshot::{HistorySnapshotStore, SnapshotError};
use tutor_domain::{Message, ScenarioId};

/// Longest encoded stem used as-is; leaves room for `.json.tmp` under the
/// usual 255-byte file name limit.
const MAX_STEM_LEN: usize = 200;
/// Readable prefix kept in front of the hash of an over-long id
const HASHED_PREFIX_LEN: usize = 120;

/// Snapshot file contents
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    scenario_id: ScenarioId,
    saved_at: DateTime<Utc>,
    messages: Vec<Message>,
}

/// Snapshot store writing `<directory>/<encoded scenario id>.json`.
pub struct JsonFileSnapshotStore {
    directory: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the snapshot file for a scenario.
    pub fn path_for(&self, scenario_id: &ScenarioId) -> PathBuf {
        self.directory
            .join(format!("{}.json", file_stem(scenario_id.as_str())))
    }
}

#[async_trait]
impl HistorySnapshotStore for JsonFileSnapshotStore {
    async fn snapshot(&self, scenario_id: &ScenarioId, messages: &[Message]) -> Result<(), SnapshotError> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let file = SnapshotFile {
            scenario_id: scenario_id.clone(),
            saved_at: Utc::now(),
            messages: messages.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|e| SnapshotError::Format(e.to_string()))?;

        let path = self.path_for(scenario_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("Snapshot of {} written ({} messages)", scenario_id, messages.len());
        Ok(())
    }

    async fn restore(&self, scenario_id: &ScenarioId) -> Result<Option<Vec<Message>>, SnapshotError> {
        let path = self.path_for(scenario_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: SnapshotFile =
            serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Format(e.to_string()))?;
        if &file.scenario_id != scenario_id {
            return Err(SnapshotError::Format(format!(
                "{} holds scenario {}, expected {}",
                path.display(),
                file.scenario_id,
                scenario_id
            )));
        }
        Ok(Some(file.messages))
    }

    async fn discard(&self, scenario_id: &ScenarioId) -> Result<(), SnapshotError> {
        match tokio::fs::remove_file(self.path_for(scenario_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Percent-encode everything but ASCII alphanumerics, `-`, `_` and `=`.
///
/// Stems longer than [`MAX_STEM_LEN`] become `<prefix>~<sha256 prefix>`.
/// `~` is always escaped in plain stems, so the two forms never collide.
fn file_stem(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'=' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    if out.len() <= MAX_STEM_LEN {
        return out;
    }

    let digest = format!("{:x}", Sha256::digest(id.as_bytes()));
    // The encoded stem is pure ASCII, so any byte index is a char boundary.
    out.truncate(HASHED_PREFIX_LEN);
    format!("{}~{}", out, &digest[..32])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_domain::{Generation, InteractionMessage, NarrationMessage, Scenario};

    fn sample(scenario: &Scenario) -> Vec<Message> {
        vec![
            NarrationMessage::assistant(scenario.id().clone(), "Welcome!", Generation::new(1)).into(),
            InteractionMessage::user(scenario.id().clone(), "Why is the sky blue?", Generation::new(1)).into(),
        ]
    }

    #[test]
    fn test_file_stem_escapes_separators() {
        assert_eq!(file_stem("x/general/"), "x%2Fgeneral%2F");
        assert_eq!(file_stem("a%b"), "a%25b");
        assert_eq!(file_stem("dr-cell/menu/topic=bio"), "dr-cell%2Fmenu%2Ftopic=bio");
    }

    #[test]
    fn test_file_stem_hashes_long_ids() {
        let long = "x/task/".to_string() + &"lesson=a b c ".repeat(40);
        let other = "x/task/".to_string() + &"lesson=a b d ".repeat(40);

        let stem = file_stem(&long);
        assert!(stem.len() <= MAX_STEM_LEN);
        assert!(stem.starts_with("x%2Ftask%2F"));
        assert_eq!(stem, file_stem(&long));
        assert_ne!(stem, file_stem(&other));
    }

    #[tokio::test]
    async fn test_long_scenario_id_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path());
        let scenario = Scenario::task("dr-cell")
            .unwrap()
            .with_context("lesson", "cell membranes & transport ".repeat(12))
            .unwrap()
            .with_context("step", "osmosis: water across a semi-permeable wall ".repeat(6))
            .unwrap();
        let messages = sample(&scenario);

        store.snapshot(scenario.id(), &messages).await.unwrap();
        assert_eq!(store.restore(scenario.id()).await.unwrap(), Some(messages));
    }

    #[tokio::test]
    async fn test_snapshot_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("snapshots"));
        let scenario = Scenario::menu("dr-cell").unwrap().with_context("topic", "bio").unwrap();
        let messages = sample(&scenario);

        store.snapshot(scenario.id(), &messages).await.unwrap();
        let restored = store.restore(scenario.id()).await.unwrap().unwrap();

        assert_eq!(restored, messages);
        assert!(store.path_for(scenario.id()).exists());
    }

    #[tokio::test]
    async fn test_restore_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path());
        let scenario = Scenario::general("x").unwrap();

        assert!(store.restore(scenario.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_discard_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path());
        let scenario = Scenario::general("x").unwrap();

        store.snapshot(scenario.id(), &sample(&scenario)).await.unwrap();
        store.discard(scenario.id()).await.unwrap();
        assert!(store.restore(scenario.id()).await.unwrap().is_none());
        store.discard(scenario.id()).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path());
        let scenario = Scenario::general("x").unwrap();
        std::fs::write(store.path_for(scenario.id()), b"{ not json").unwrap();

        assert!(matches!(
            store.restore(scenario.id()).await,
            Err(SnapshotError::Format(_))
        ));
    }
}
