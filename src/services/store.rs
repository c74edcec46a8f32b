//! Snapshot key-value store

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::debug;

use crate::state::CountdownSnapshot;

/// Persistent home of the countdown snapshot
#[derive(Debug, Clone)]
pub enum SnapshotStore {
    /// JSON document on disk
    File(PathBuf),
    /// Process memory only
    Memory(Arc<Mutex<Option<CountdownSnapshot>>>),
}

impl SnapshotStore {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SnapshotStore::File(path.into())
    }

    pub fn memory() -> Self {
        SnapshotStore::Memory(Arc::new(Mutex::new(None)))
    }

    /// Overwrite the stored snapshot
    pub fn save(&self, snapshot: &CountdownSnapshot) -> Result<(), String> {
        match self {
            SnapshotStore::File(path) => {
                let json = serde_json::to_vec_pretty(snapshot)
                    .map_err(|e| format!("Failed to encode snapshot: {}", e))?;

                // Write next to the target and rename so a crash never leaves half a file
                let tmp = tmp_path(path);
                fs::write(&tmp, json)
                    .map_err(|e| format!("Failed to write {}: {}", tmp.display(), e))?;
                fs::rename(&tmp, path)
                    .map_err(|e| format!("Failed to replace {}: {}", path.display(), e))?;

                debug!("Snapshot saved to {}", path.display());
                Ok(())
            }
            SnapshotStore::Memory(slot) => {
                let mut slot = slot
                    .lock()
                    .map_err(|e| format!("Failed to lock snapshot slot: {}", e))?;
                *slot = Some(snapshot.clone());
                Ok(())
            }
        }
    }

    /// Read the stored snapshot, `None` if nothing was saved yet
    pub fn load(&self) -> Result<Option<CountdownSnapshot>, String> {
        match self {
            SnapshotStore::File(path) => {
                if !path.exists() {
                    return Ok(None);
                }
                let bytes = fs::read(path)
                    .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
                serde_json::from_slice(&bytes)
                    .map(Some)
                    .map_err(|e| format!("Failed to decode {}: {}", path.display(), e))
            }
            SnapshotStore::Memory(slot) => slot
                .lock()
                .map(|slot| slot.clone())
                .map_err(|e| format!("Failed to lock snapshot slot: {}", e)),
        }
    }

    /// Forget the stored snapshot
    pub fn clear(&self) -> Result<(), String> {
        match self {
            SnapshotStore::File(path) => {
                if path.exists() {
                    fs::remove_file(path)
                        .map_err(|e| format!("Failed to remove {}: {}", path.display(), e))?;
                }
                Ok(())
            }
            SnapshotStore::Memory(slot) => {
                let mut slot = slot
                    .lock()
                    .map_err(|e| format!("Failed to lock snapshot slot: {}", e))?;
                *slot = None;
                Ok(())
            }
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
