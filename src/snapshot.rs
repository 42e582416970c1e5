use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::Result;

/// Point-in-time capture of a session, flat enough for any key-value store.
///
/// Fields are signed so that hand-edited or foreign data reaches
/// [`crate::session::SessionController::restore`] intact and gets rejected
/// there instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub score: i64,
    #[serde(rename = "timeLeft")]
    pub time_left: i64,
}

pub trait SnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::snapshot_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(snapshot)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::tempdir;

    #[test]
    fn serializes_with_flat_keys() {
        let json = serde_json::to_value(Snapshot {
            score: 12,
            time_left: 34,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"score": 12, "timeLeft": 34}));
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn save_load_and_clear() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::with_path(dir.path().join("state").join("snapshot.json"));
        let snap = Snapshot {
            score: 7,
            time_left: 41,
        };
        store.save(&snap).unwrap();
        assert_eq!(store.load().unwrap(), Some(snap));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, b"{\"score\": 1").unwrap();
        let store = FileSnapshotStore::with_path(&path);
        assert!(matches!(store.load(), Err(Error::Json(_))));
    }
}
