//! Cross-process lock around binary replacement.
//!
//! Two ghex processes updating the same installation would race on the backup
//! file and the executable. [`UpdateLock`] serialises the backup-to-replace
//! section and rollbacks with an exclusive `fs4` lock on `update.lock` next to
//! the backup file. The lock is released when the guard is dropped.
//!
//! File operations run in `spawn_blocking` so a contended lock never parks a
//! runtime worker.

use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS, default_lock_timeout};
use crate::core::GhexError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

/// File name of the lock inside the backup directory.
pub const LOCK_FILE_NAME: &str = "update.lock";

/// What the lock is taken for. Shows up in logs and timeout errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPurpose {
    /// Backup and replace during `ghex update`
    Update,
    /// Restoring the backup during `ghex update --rollback`
    Rollback,
}

impl LockPurpose {
    /// Lowercase label, e.g. `update`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Rollback => "rollback",
        }
    }
}

impl std::fmt::Display for LockPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guard for the exclusive update lock.
#[derive(Debug)]
pub struct UpdateLock {
    _file: Arc<File>,
    path: PathBuf,
    purpose: LockPurpose,
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        // Closing the handle releases the OS lock; the file itself is left in
        // place so a waiter never locks an unlinked inode.
        debug!(path = %self.path.display(), purpose = %self.purpose, "Update lock released");
    }
}

impl UpdateLock {
    /// Acquire the lock in `dir` for `purpose` with the default timeout.
    ///
    /// # Errors
    ///
    /// See [`acquire_with_timeout`](Self::acquire_with_timeout).
    pub async fn acquire(dir: &Path, purpose: LockPurpose) -> Result<Self, GhexError> {
        Self::acquire_with_timeout(dir, purpose, default_lock_timeout()).await
    }

    /// Acquire the lock in `dir`, polling with exponential backoff.
    ///
    /// # Errors
    ///
    /// - [`GhexError::LockTimeout`] when another process keeps the lock past `timeout`
    /// - [`GhexError::IoError`] when the directory or lock file cannot be created
    pub async fn acquire_with_timeout(
        dir: &Path,
        purpose: LockPurpose,
        timeout: Duration,
    ) -> Result<Self, GhexError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(LOCK_FILE_NAME);
        debug!(path = %path.display(), purpose = %purpose, "Waiting for update lock");

        let open_path = path.clone();
        let file = tokio::task::spawn_blocking(move || {
            OpenOptions::new().create(true).write(true).truncate(false).open(&open_path)
        })
        .await
        .map_err(join_error)??;
        let file = Arc::new(file);

        let start = Instant::now();
        let backoff = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS));

        for delay in backoff {
            let attempt = Arc::clone(&file);
            let locked = tokio::task::spawn_blocking(move || attempt.try_lock_exclusive())
                .await
                .map_err(join_error)?;

            if matches!(locked, Ok(true)) {
                debug!(
                    path = %path.display(),
                    purpose = %purpose,
                    wait_ms = start.elapsed().as_millis(),
                    "Update lock acquired"
                );
                return Ok(Self {
                    _file: file,
                    path,
                    purpose,
                });
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }
            debug!(purpose = %purpose, "Update lock held by another ghex process, retrying");
            tokio::time::sleep(delay.min(remaining)).await;
        }

        Err(GhexError::LockTimeout {
            operation: purpose.to_string(),
            path,
            seconds: timeout.as_secs(),
        })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// What this lock was taken for.
    #[must_use]
    pub fn purpose(&self) -> LockPurpose {
        self.purpose
    }
}

fn join_error(e: tokio::task::JoinError) -> GhexError {
    GhexError::Other {
        message: format!("lock task failed: {e}"),
    }
}
