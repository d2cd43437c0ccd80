//! Local task cache: one JSON document per fixed key, stored as `<dir>/<key>.json`.
//!
//! Entries never expire. A corrupted entry is dropped on load and the caller
//! falls back to a fresh session.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::CacheError;

#[derive(Clone, Debug)]
pub struct TaskCache {
    dir: PathBuf,
}

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl TaskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        if !valid_key(key) {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Serialize `state` and overwrite whatever is stored under `key`.
    #[instrument(level = "debug", skip(self, state))]
    pub async fn save<T: Serialize>(&self, key: &str, state: &T) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec(state)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write-then-rename so a crash mid-write never leaves half a document.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(target: "cache", %key, bytes = bytes.len(), "Saved task snapshot");
        Ok(())
    }

    /// Read and decode the entry under `key`. Absent or unreadable entries yield `None`.
    #[instrument(level = "debug", skip(self))]
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = match self.path_for(key) {
            Ok(p) => p,
            Err(e) => {
                warn!(target: "cache", %key, error = %e, "Refusing to load cache entry");
                return None;
            }
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(target: "cache", %key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_slice::<T>(&bytes) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(target: "cache", %key, error = %e, "Discarding corrupted cache entry");
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(target: "cache", %key, error = %e, "Failed to remove corrupted cache entry");
                }
                None
            }
        }
    }

    /// Remove the entry under `key`. Missing entries are fine.
    #[instrument(level = "debug", skip(self))]
    pub async fn clear(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// `save` that only logs on failure.
    pub async fn save_guarded<T: Serialize>(&self, key: &str, state: &T) {
        if let Err(e) = self.save(key, state).await {
            warn!(target: "cache", %key, error = %e, "Task snapshot not persisted");
        }
    }

    /// `clear` that only logs on failure.
    pub async fn clear_guarded(&self, key: &str) {
        if let Err(e) = self.clear(key).await {
            warn!(target: "cache", %key, error = %e, "Task snapshot not cleared");
        }
    }
}
