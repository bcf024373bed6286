//! File-backed snapshot store: one JSON file per editing surface.

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::models::DraftSnapshot;

use super::{SnapshotKey, SnapshotStore};

/// Snapshot store persisting each key as a JSON file under an owned directory.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Open a store rooted at the given directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &SnapshotKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.slot()))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, key: &SnapshotKey, snapshot: &DraftSnapshot) -> Result<()> {
        let serialized = serde_json::to_string(snapshot)?;
        fs::write(self.path_for(key), serialized)
            .map_err(|error| Error::Snapshot(format!("write failed: {error}")))
    }

    fn load(&self, key: &SnapshotKey) -> Result<Option<DraftSnapshot>> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(error) => {
                // A corrupt snapshot must not brick session start; treat it
                // as absent.
                tracing::warn!(
                    "Ignoring corrupt draft snapshot at {}: {error}",
                    path.display()
                );
                Ok(None)
            }
        }
    }

    fn clear(&self, key: &SnapshotKey) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
