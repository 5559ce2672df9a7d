//! File-backed lock state persistence.
//!
//! The whole record is rewritten on every save:
//!
//! ```json
//! {"is_locked": true, "lock_triggered": true, "last_updated": "2024-01-03T19:55:00.000000"}
//! ```
//!
//! # Defensive Design
//!
//! Loading never fails. Missing, empty, unreadable or corrupt files all yield
//! the unlocked default, with a warning in the log. The caller's in-memory
//! state stays authoritative when a save fails.
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so the killer never sees a half-written record.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, RulerError};

use super::types::{LockState, StateRecord};

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the application-data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::paths::state_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> LockState {
        let content = match fs_err::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No state file found, using defaults");
                return LockState::default();
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read state file, using defaults");
                return LockState::default();
            }
        };

        if content.trim().is_empty() {
            tracing::warn!(path = %self.path.display(), "Empty state file, using defaults");
            return LockState::default();
        }

        match serde_json::from_str::<StateRecord>(&content) {
            Ok(record) => {
                let state = record.state();
                tracing::info!(
                    is_locked = state.is_locked,
                    lock_triggered = state.lock_triggered,
                    "State loaded"
                );
                state
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %self.path.display(),
                    "Failed to parse state file, using defaults"
                );
                LockState::default()
            }
        }
    }

    /// Writes the full record. `last_updated` is stored as given.
    pub fn save(&self, state: &LockState, last_updated: String) -> Result<()> {
        let record = StateRecord::new(*state, last_updated);
        let content = serde_json::to_string(&record).map_err(|source| RulerError::Json {
            context: "serialize state".into(),
            source,
        })?;

        let parent_dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs_err::create_dir_all(parent_dir)
            .map_err(|err| RulerError::io("create state directory", err))?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .map_err(|err| RulerError::io("create temp state file", err))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|err| RulerError::io("write temp state file", err))?;
        temp_file
            .flush()
            .map_err(|err| RulerError::io("flush temp state file", err))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| RulerError::io("replace state file", err.error))?;

        tracing::debug!(
            is_locked = state.is_locked,
            lock_triggered = state.lock_triggered,
            "State saved"
        );
        Ok(())
    }

    /// Deletes the state file. Returns false when there was nothing to delete.
    pub fn remove(&self) -> Result<bool> {
        match fs_err::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(RulerError::io("remove state file", err)),
        }
    }
}
