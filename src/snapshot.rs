//! Local file-based snapshot persistence for store state.
//!
//! Snapshots are stored as JSON files at
//! `<base_dir>/<aggregate_type>/<instance_id>.json`.
//! Writes are atomic via a temp-rename pattern to prevent corruption
//! from crashes mid-write.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::aggregate::Aggregate;

/// A point-in-time copy of an aggregate's state.
///
/// `version` counts the events folded into `state`; a restored store
/// resumes counting from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "A: Serialize", deserialize = "A: DeserializeOwned"))]
pub struct Snapshot<A> {
    /// The aggregate state at the time of the snapshot.
    pub state: A,
    /// Number of events applied when the snapshot was taken.
    pub version: u64,
    /// Wall-clock time of the save.
    pub saved_at: DateTime<Utc>,
}

/// Filesystem path of the snapshot for one store instance.
///
/// # Returns
///
/// `<base_dir>/<aggregate_type>/<instance_id>.json`
pub fn snapshot_path(base_dir: &Path, aggregate_type: &str, instance_id: &str) -> PathBuf {
    base_dir
        .join(aggregate_type)
        .join(format!("{instance_id}.json"))
}

/// Save a snapshot atomically to disk.
///
/// Writes `<instance_id>.json.tmp` next to the target, then renames it
/// over the target so readers never see a partially-written file.
///
/// # Errors
///
/// Returns `io::Error` if directory creation, serialization, file writing,
/// or renaming fails.
pub fn save_snapshot<A: Aggregate>(
    base_dir: &Path,
    instance_id: &str,
    snapshot: &Snapshot<A>,
) -> io::Result<()> {
    let path = snapshot_path(base_dir, A::AGGREGATE_TYPE, instance_id);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(&tmp_path, &json)?;
    std::fs::rename(&tmp_path, &path)?;
    tracing::debug!(
        aggregate_type = A::AGGREGATE_TYPE,
        instance_id,
        version = snapshot.version,
        "snapshot saved"
    );
    Ok(())
}

/// Load a snapshot from disk.
///
/// # Returns
///
/// - `Ok(Some(snapshot))` if the file exists and deserializes successfully.
/// - `Ok(None)` if the file does not exist or contains invalid JSON.
///   A corrupt file is logged and the store starts from its initial state.
///
/// # Errors
///
/// Returns `io::Error` only for unexpected I/O failures (e.g. permission denied).
pub fn load_snapshot<A: Aggregate>(
    base_dir: &Path,
    instance_id: &str,
) -> io::Result<Option<Snapshot<A>>> {
    let path = snapshot_path(base_dir, A::AGGREGATE_TYPE, instance_id);
    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    match serde_json::from_slice::<Snapshot<A>>(&bytes) {
        Ok(snap) => Ok(Some(snap)),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "corrupt snapshot, starting from initial state"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_fixtures::Counter;

    fn snapshot(value: u64, version: u64) -> Snapshot<Counter> {
        Snapshot {
            state: Counter { value },
            version,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_path_returns_expected_path() {
        let path = snapshot_path(Path::new("/var/lib/portal"), "catalog", "default");
        assert_eq!(path, PathBuf::from("/var/lib/portal/catalog/default.json"));
    }

    #[test]
    fn saved_snapshot_is_loaded_back() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        save_snapshot::<Counter>(dir.path(), "c-1", &snapshot(42, 7)).expect("save should succeed");

        let loaded = load_snapshot::<Counter>(dir.path(), "c-1")
            .expect("load should succeed")
            .expect("snapshot should exist");
        assert_eq!(loaded.state.value, 42);
        assert_eq!(loaded.version, 7);
    }

    #[test]
    fn load_nonexistent_returns_none() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let result =
            load_snapshot::<Counter>(dir.path(), "no-such-id").expect("load should succeed");
        assert!(result.is_none());
    }

    #[test]
    fn load_corrupt_json_returns_none() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = snapshot_path(dir.path(), "counter", "c-bad");
        std::fs::create_dir_all(path.parent().unwrap()).expect("create dir");
        std::fs::write(&path, b"{ not json").expect("write corrupt file");

        let result =
            load_snapshot::<Counter>(dir.path(), "c-bad").expect("load should succeed (not Err)");
        assert!(result.is_none(), "corrupt JSON should be treated as absent");
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        save_snapshot::<Counter>(dir.path(), "c-atomic", &snapshot(10, 3))
            .expect("save should succeed");

        let final_path = snapshot_path(dir.path(), "counter", "c-atomic");
        assert!(final_path.exists(), "final snapshot file should exist");
        assert!(!final_path.with_extension("json.tmp").exists());
    }
}
