// src/store/mod.rs

//! Session-scoped persistence of [`DagState`].
//!
//! One `<session>.json` per session under the state directory. Writes go
//! through a temp file in the same directory and an atomic rename, so a
//! reader never observes a half-written file. Load/mutate/save cycles hold
//! an advisory lock on `<session>.json.lock`.

pub mod lock;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::model::StateSection;
use crate::errors::StoreError;
use crate::plan::scheduler::{DagState, RawDagState};

pub use lock::SessionLock;

const STATE_EXT: &str = "json";

/// Directory-backed store of per-session plan state.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout,
        }
    }

    /// Build from `[state]`, falling back to [`StateStore::default_dir`].
    pub fn from_config(cfg: &StateSection) -> Self {
        let dir = cfg.dir.clone().unwrap_or_else(Self::default_dir);
        Self::new(dir, Duration::from_millis(cfg.lock_timeout_ms))
    }

    /// `$HOME/.plandag/dag`, or `.plandag/dag` when no home is known.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".plandag")
            .join("dag")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the state file for `session_id`.
    ///
    /// Session ids become file names, so path separators and dot-only
    /// names are rejected.
    pub fn path_for(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let bad = session_id.is_empty()
            || session_id.chars().all(|c| c == '.')
            || session_id
                .chars()
                .any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control());
        if bad {
            return Err(StoreError::InvalidSessionId(session_id.to_string()));
        }
        Ok(self.dir.join(format!("{session_id}.{STATE_EXT}")))
    }

    /// Persist `state` under its session id, replacing any previous state.
    pub fn save(&self, state: &DagState) -> Result<(), StoreError> {
        let path = self.path_for(&state.session_id)?;
        self.ensure_dir()?;
        let _lock = SessionLock::acquire(&path, self.lock_timeout)?;
        write_atomic(&path, state)
    }

    /// Load the state for `session_id`; a missing file is [`StoreError::NotFound`].
    pub fn load(&self, session_id: &str) -> Result<DagState, StoreError> {
        let path = self.path_for(session_id)?;
        read_state(&path)?.ok_or_else(|| StoreError::NotFound(session_id.to_string()))
    }

    /// Like [`StateStore::load`], but a missing file is `Ok(None)`.
    pub fn load_optional(&self, session_id: &str) -> Result<Option<DagState>, StoreError> {
        let path = self.path_for(session_id)?;
        read_state(&path)
    }

    /// Remove the state file (and its lock file). Missing files are not an error.
    pub fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(session_id)?;
        remove_if_exists(&path)?;
        remove_if_exists(&lock::lock_path(&path))?;
        debug!(session = %session_id, "state deleted");
        Ok(())
    }

    /// Load, mutate and save under the session lock.
    ///
    /// Returns `Ok(None)` without calling `f` when the session has no state.
    /// The state is written back even if `f` changed nothing.
    pub fn update<F, R>(&self, session_id: &str, f: F) -> Result<Option<R>, StoreError>
    where
        F: FnOnce(&mut DagState) -> R,
    {
        let path = self.path_for(session_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let _lock = SessionLock::acquire(&path, self.lock_timeout)?;

        let Some(mut state) = read_state(&path)? else {
            return Ok(None);
        };
        let out = f(&mut state);
        write_atomic(&path, &state)?;
        Ok(Some(out))
    }

    /// Remove state files not modified for `max_age_days`, plus their lock
    /// files. A missing state directory counts as nothing to do.
    pub fn cleanup_old(&self, max_age_days: u64) -> Result<usize, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let max_age = Duration::from_secs(max_age_days.saturating_mul(24 * 60 * 60));
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(STATE_EXT) {
                continue;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(e) => {
                    warn!(?path, error = %e, "cannot stat state file; skipping");
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age < max_age {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    removed += 1;
                    let _ = fs::remove_file(lock::lock_path(&path));
                    debug!(?path, age_secs = age.as_secs(), "removed stale state");
                }
                Err(e) => warn!(?path, error = %e, "failed to remove stale state"),
            }
        }

        info!(dir = ?self.dir, removed, max_age_days, "cleanup finished");
        Ok(removed)
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Mkdir {
            path: self.dir.clone(),
            source,
        })
    }
}

fn read_state(path: &Path) -> Result<Option<DagState>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    // Two steps so a structurally bad graph is reported apart from bad JSON.
    let raw: RawDagState =
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Unmarshal {
            path: path.to_path_buf(),
            source,
        })?;
    DagState::try_from(raw)
        .map(Some)
        .map_err(|source| StoreError::Invalid {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize to a sibling temp file, fsync, then rename over `path`.
/// Callers hold the session lock.
fn write_atomic(path: &Path, state: &DagState) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(state).map_err(StoreError::Marshal)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&json).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(?path, bytes = json.len(), "state saved");
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Write {
            path: path.to_path_buf(),
            source,
        }),
    }
}
