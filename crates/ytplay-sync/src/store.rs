//! Persistence of the last good snapshot for offline restoration.
//!
//! Best effort only: callers log and drop every [`StoreError`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use ytplay_core::snapshot::PersistedSnapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot store json: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait SnapshotStore: Send + Sync {
    /// The persisted snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<PersistedSnapshot>, StoreError>;
    fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError>;
}

/// One JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<PersistedSnapshot>, StoreError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(snapshot)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store, used when no state directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<PersistedSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: PersistedSnapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
        }
    }

    pub fn saved(&self) -> Option<PersistedSnapshot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedSnapshot>, StoreError> {
        Ok(self.saved())
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(())
    }
}
