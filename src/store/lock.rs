// src/store/lock.rs

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::errors::StoreError;

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive advisory lock on `<state file>.lock`, released on drop.
///
/// Guards the load/mutate/save cycle so overlapping invocations for the same
/// session serialize instead of overwriting each other.
#[derive(Debug)]
pub struct SessionLock {
    file: File,
    path: PathBuf,
}

impl SessionLock {
    /// Acquire the lock for `state_path`, retrying until `timeout` elapses.
    pub fn acquire(state_path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let path = lock_path(state_path);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::Lock {
                path: path.clone(),
                reason: format!("open: {e}"),
            })?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(?path, waited_ms = started.elapsed().as_millis() as u64, "lock acquired");
                    return Ok(Self { file, path });
                }
                Err(e) if started.elapsed() >= timeout => {
                    return Err(StoreError::Lock {
                        path,
                        reason: format!("not acquired within {timeout:?}: {e}"),
                    });
                }
                Err(_) => thread::sleep(RETRY_INTERVAL),
            }
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = ?self.path, error = %e, "failed to release session lock");
        }
    }
}

pub fn lock_path(state_path: &Path) -> PathBuf {
    let mut name = state_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
