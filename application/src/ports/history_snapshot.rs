//! History Snapshot port
//!
//! Optional mirror of scenario histories for crash recovery. The engine works
//! identically without one; snapshot failures are logged and ignored.

use async_trait::async_trait;
use thiserror::Error;
use tutor_domain::{Message, ScenarioId};

/// Errors from a snapshot store
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),
}

/// Persistence collaborator offered snapshots of settled histories
#[async_trait]
pub trait HistorySnapshotStore: Send + Sync {
    /// Whether snapshots should be taken at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Replace the stored history of a scenario.
    async fn snapshot(&self, scenario_id: &ScenarioId, messages: &[Message]) -> Result<(), SnapshotError>;

    /// Load a previously stored history, if any.
    async fn restore(&self, scenario_id: &ScenarioId) -> Result<Option<Vec<Message>>, SnapshotError>;

    /// Forget a terminated scenario.
    async fn discard(&self, scenario_id: &ScenarioId) -> Result<(), SnapshotError>;
}

/// No-op implementation: pure in-memory mode.
pub struct NoHistorySnapshots;

#[async_trait]
impl HistorySnapshotStore for NoHistorySnapshots {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn snapshot(&self, _scenario_id: &ScenarioId, _messages: &[Message]) -> Result<(), SnapshotError> {
        Ok(())
    }

    async fn restore(&self, _scenario_id: &ScenarioId) -> Result<Option<Vec<Message>>, SnapshotError> {
        Ok(None)
    }

    async fn discard(&self, _scenario_id: &ScenarioId) -> Result<(), SnapshotError> {
        Ok(())
    }
}
