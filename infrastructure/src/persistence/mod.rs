//! History snapshot persistence
//!
//! Provides [`JsonFileSnapshotStore`], which implements the
//! [`HistorySnapshotStore`](tutor_application::HistorySnapshotStore) port
//! with one JSON document per scenario.

mod json_file;

pub use json_file::JsonFileSnapshotStore;
