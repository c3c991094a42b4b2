use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::codec::{self, DecodeError};
use crate::model::ManagerSnapshot;

/// File name of the on-disk cache, inside the per-user configuration directory.
pub const CACHE_FILE_NAME: &str = "flamenco-manager-info.json";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No cache on disk yet. This is the normal cold-start state.
    #[error("{} not found in {}", file_name(.0), parent(.0))]
    NotFound(PathBuf),
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parent(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("could not encode manager info: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Single-slot snapshot cache backed by one JSON file.
///
/// One instance is shared per process and handed to consumers by reference.
/// Lock order is `update`, then `file`, then `slot`; `slot` is never held
/// across I/O.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    slot: Mutex<Option<Arc<ManagerSnapshot>>>,
    file: Mutex<()>,
    update: Mutex<()>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CacheStore {
    /// Creates an empty store persisting to `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: Mutex::new(None),
            file: Mutex::new(()),
            update: Mutex::new(()),
        }
    }

    /// Creates a store persisting to [`CACHE_FILE_NAME`] inside `config_dir`.
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join(CACHE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the cache file, replacing the in-memory snapshot on success.
    pub fn load_from_disk(&self) -> Result<Arc<ManagerSnapshot>, LoadError> {
        let _update = lock(&self.update);
        let snapshot = self.read_from_disk()?;
        Ok(self.set_cached(snapshot))
    }

    fn read_from_disk(&self) -> Result<ManagerSnapshot, LoadError> {
        let bytes = {
            let _file = lock(&self.file);
            match std::fs::read(&self.path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(LoadError::NotFound(self.path.clone()))
                }
                Err(source) => {
                    return Err(LoadError::Read {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        };

        let snapshot = codec::decode(&bytes).map_err(|source| LoadError::Decode {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "loaded manager info from disk");
        Ok(snapshot)
    }

    /// Writes `snapshot` to the cache file, creating parent directories.
    ///
    /// The file is written next to its final location and renamed into place,
    /// so readers never see a half-written document.
    pub fn save_to_disk(&self, snapshot: &ManagerSnapshot) -> Result<(), SaveError> {
        let bytes = codec::encode(snapshot)?;
        let write_err = |source| SaveError::Write {
            path: self.path.clone(),
            source,
        };

        let _file = lock(&self.file);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        debug!(path = %self.path.display(), "saved manager info to disk");
        Ok(())
    }

    /// Empties the slot, then tries to fill it from disk.
    ///
    /// A missing file yields `None` silently; an unreadable or undecodable file
    /// is logged and also yields `None`, as if there never was a cache.
    pub fn load_into_cache(&self) -> Option<Arc<ManagerSnapshot>> {
        let _update = lock(&self.update);
        lock(&self.slot).take();
        self.warm_from_disk()
    }

    /// Returns the in-memory snapshot, warming it from disk if the slot is empty.
    pub fn get_cached(&self) -> Option<Arc<ManagerSnapshot>> {
        if let Some(snapshot) = self.peek() {
            return Some(snapshot);
        }

        let _update = lock(&self.update);
        // An update may have filled the slot while we waited.
        if let Some(snapshot) = self.peek() {
            return Some(snapshot);
        }
        self.warm_from_disk()
    }

    /// Fills the empty slot from disk. The caller holds `update`.
    fn warm_from_disk(&self) -> Option<Arc<ManagerSnapshot>> {
        match self.read_from_disk() {
            Ok(snapshot) => Some(self.set_cached(snapshot)),
            Err(LoadError::NotFound(_)) => None,
            Err(e) => {
                warn!("could not load Flamenco Manager info from disk: {e}");
                None
            }
        }
    }

    /// Returns the in-memory snapshot without touching the disk.
    pub fn peek(&self) -> Option<Arc<ManagerSnapshot>> {
        lock(&self.slot).clone()
    }

    /// Replaces the in-memory snapshot. Does not persist.
    pub fn set_cached(&self, snapshot: ManagerSnapshot) -> Arc<ManagerSnapshot> {
        let snapshot = Arc::new(snapshot);
        *lock(&self.slot) = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Runs `produce` and stores its snapshot, as one critical section with
    /// respect to other updates, disk loads and [`CacheStore::clear`].
    ///
    /// On error the previous snapshot is left untouched. `produce` must not
    /// call back into the store.
    pub fn update<E>(
        &self,
        produce: impl FnOnce() -> Result<ManagerSnapshot, E>,
    ) -> Result<Arc<ManagerSnapshot>, E> {
        let _update = lock(&self.update);
        let snapshot = produce()?;
        Ok(self.set_cached(snapshot))
    }

    /// Drops the in-memory snapshot. The disk file is kept.
    pub fn clear(&self) {
        let _update = lock(&self.update);
        lock(&self.slot).take();
    }
}
