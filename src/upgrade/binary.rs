use crate::core::GhexError;
use crate::upgrade::permissions::permission_error;
use crate::upgrade::replace::{ReplaceOutcome, ReplaceStrategy, default_strategy, set_executable};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Size and age of the current backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// Backup file location
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, i.e. when the backup was taken
    pub modified: DateTime<Utc>,
}

/// Owns the installed ghex executable and its single backup copy.
///
/// An update attempt moves through `Idle -> BackedUp -> Replaced`, or
/// `BackedUp -> RolledBack` when the replace step fails. Only one backup
/// generation is kept; every [`backup`](Self::backup) overwrites the previous one.
///
/// # Backup location
///
/// - Windows: `%APPDATA%\ghex\backup\ghex.exe.backup`
/// - Elsewhere: `~/.ghex/backup/ghex.backup`
///
/// # Examples
///
/// ```rust,no_run
/// use ghex_cli::upgrade::BinaryManager;
///
/// # async fn example() -> Result<(), ghex_cli::core::GhexError> {
/// let manager = BinaryManager::new()?;
/// manager.backup().await?;
/// if manager.has_backup() {
///     println!("Backup at {}", manager.backup_path().display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BinaryManager {
    binary_path: PathBuf,
    backup_path: PathBuf,
    strategy: Arc<dyn ReplaceStrategy>,
}

impl BinaryManager {
    /// Manager for the running executable and the per-user backup location.
    ///
    /// # Errors
    ///
    /// Fails when the executable path or the home directory cannot be determined.
    pub fn new() -> Result<Self, GhexError> {
        Ok(Self::with_paths(current_binary_path()?, default_backup_path()?))
    }

    /// Manager for explicit paths, using the platform's replace strategy.
    #[must_use]
    pub fn with_paths(binary_path: PathBuf, backup_path: PathBuf) -> Self {
        Self {
            binary_path,
            backup_path,
            strategy: default_strategy(),
        }
    }

    /// Swap in a different replace strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn ReplaceStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Installed executable path.
    #[must_use]
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Backup file path.
    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Directory holding the backup file and the update lock.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        self.backup_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Copy the installed binary over the backup file.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::BackupFailed`] on any I/O error. Callers must not
    /// replace the binary without a successful backup.
    pub async fn backup(&self) -> Result<(), GhexError> {
        let failed = |reason: String| GhexError::BackupFailed {
            path: self.backup_path.clone(),
            reason,
        };

        fs::create_dir_all(self.backup_dir())
            .await
            .map_err(|e| failed(format!("cannot create backup directory: {e}")))?;

        info!("Creating backup at {}", self.backup_path.display());
        fs::copy(&self.binary_path, &self.backup_path)
            .await
            .map_err(|e| failed(format!("cannot copy {}: {e}", self.binary_path.display())))?;

        Ok(())
    }

    /// Put the backup back in place of the installed binary.
    ///
    /// The current binary is first renamed to `<binary>.old`, which works
    /// even while Windows holds the running image open, and is renamed back
    /// if the copy fails. On Windows the whole step is retried up to three
    /// times, one second apart.
    ///
    /// # Errors
    ///
    /// - [`GhexError::NoBackupAvailable`] when there is no backup
    /// - [`GhexError::RestoreFailed`] on I/O errors
    pub async fn restore(&self) -> Result<(), GhexError> {
        if !self.has_backup() {
            return Err(GhexError::NoBackupAvailable {
                path: self.backup_path.clone(),
            });
        }

        warn!("Restoring from backup at {}", self.backup_path.display());

        let max_attempts: u32 = if cfg!(windows) { 3 } else { 1 };
        let mut attempt = 1;
        loop {
            match self.attempt_restore().await {
                Ok(()) => {
                    info!("Successfully restored from backup");
                    return Ok(());
                }
                Err(e) if attempt < max_attempts => {
                    warn!("Restore attempt {} failed: {}. Retrying...", attempt, e);
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(GhexError::RestoreFailed {
                        path: self.binary_path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn attempt_restore(&self) -> std::io::Result<()> {
        let aside = self.aside_path();
        let moved_aside = match fs::rename(&self.binary_path, &aside).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };

        let copied = fs::copy(&self.backup_path, &self.binary_path).await;
        if let Err(e) = copied.and_then(|_| set_executable(&self.binary_path)) {
            if moved_aside {
                let _ = fs::remove_file(&self.binary_path).await;
                let _ = fs::rename(&aside, &self.binary_path).await;
            }
            return Err(e);
        }

        if moved_aside {
            // Still mapped on Windows; left for the next restore to overwrite
            if let Err(e) = fs::remove_file(&aside).await {
                debug!("Could not remove {}: {}", aside.display(), e);
            }
        }
        Ok(())
    }

    /// Where the displaced binary is parked during a restore.
    fn aside_path(&self) -> PathBuf {
        let mut name = self.binary_path.clone().into_os_string();
        name.push(".old");
        PathBuf::from(name)
    }

    /// Replace the installed binary with `new_binary` via the configured strategy.
    ///
    /// Strategies that finish after this process exits get a copy staged at
    /// `<binary>.new` instead of `new_binary` itself. The swap runs on the
    /// blocking pool and is never cancelled midway.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::ReplaceFailed`] from staging or from the strategy.
    pub async fn replace(&self, new_binary: &Path) -> Result<ReplaceOutcome, GhexError> {
        let failed = |reason: String| GhexError::ReplaceFailed {
            path: self.binary_path.clone(),
            reason,
        };

        let staged = if self.strategy.needs_staging() {
            let staged = self.staged_path();
            fs::copy(new_binary, &staged)
                .await
                .map_err(|e| failed(format!("cannot stage new binary: {e}")))?;
            Some(staged)
        } else {
            None
        };

        let strategy = Arc::clone(&self.strategy);
        let target = self.binary_path.clone();
        let source = staged.clone().unwrap_or_else(|| new_binary.to_path_buf());

        let result = tokio::task::spawn_blocking(move || strategy.replace(&target, &source))
            .await
            .map_err(|e| failed(format!("replace task failed: {e}")))
            .and_then(|inner| inner);

        if let (Err(_), Some(staged)) = (&result, &staged) {
            let _ = fs::remove_file(staged).await;
        }
        result
    }

    /// Where a new binary is staged for deferred replacement.
    #[must_use]
    pub fn staged_path(&self) -> PathBuf {
        let mut name = self.binary_path.clone().into_os_string();
        name.push(".new");
        PathBuf::from(name)
    }

    /// Whether a backup file exists. Does not check its content.
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.backup_path.is_file()
    }

    /// Size and modification time of the backup.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::NoBackupAvailable`] when there is no backup.
    pub async fn backup_info(&self) -> Result<BackupInfo, GhexError> {
        let metadata = fs::metadata(&self.backup_path).await.map_err(|_| {
            GhexError::NoBackupAvailable {
                path: self.backup_path.clone(),
            }
        })?;

        Ok(BackupInfo {
            path: self.backup_path.clone(),
            size: metadata.len(),
            modified: metadata.modified().map(DateTime::<Utc>::from)?,
        })
    }

    /// Check that the installed binary's directory is writable.
    ///
    /// # Errors
    ///
    /// See [`check_write_permission`].
    pub async fn check_write_permission(&self) -> Result<(), GhexError> {
        let path = self.binary_path.clone();
        tokio::task::spawn_blocking(move || check_write_permission(&path)).await.map_err(|e| {
            GhexError::Other {
                message: format!("permission check failed: {e}"),
            }
        })?
    }
}

/// Check write access to the directory containing `path` by creating and
/// deleting a throwaway file there.
///
/// # Errors
///
/// Returns [`GhexError::PermissionDenied`] with platform-specific instructions.
pub fn check_write_permission(path: &Path) -> Result<(), GhexError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let scratch = tempfile::Builder::new().prefix(".ghex_permission_check_").tempfile_in(dir);

    match scratch {
        Ok(file) => {
            debug!("{} is writable", dir.display());
            file.close().map_err(|_| permission_error(path))
        }
        Err(e) => {
            debug!("Write check in {} failed: {}", dir.display(), e);
            Err(permission_error(path))
        }
    }
}

/// Path of the running executable with symlinks resolved.
///
/// # Errors
///
/// Returns [`GhexError::IoError`] if the OS cannot report or resolve the path.
pub fn current_binary_path() -> Result<PathBuf, GhexError> {
    let exe = std::env::current_exe()?;
    Ok(std::fs::canonicalize(exe)?)
}

/// Per-user backup file location.
///
/// # Errors
///
/// Returns [`GhexError::Other`] when no home or roaming app-data directory exists.
pub fn default_backup_path() -> Result<PathBuf, GhexError> {
    let missing = || GhexError::Other {
        message: "Unable to determine the home directory for the backup location".to_string(),
    };

    if cfg!(windows) {
        let roaming = dirs::config_dir().ok_or_else(missing)?;
        Ok(roaming.join("ghex").join("backup").join("ghex.exe.backup"))
    } else {
        let home = dirs::home_dir().ok_or_else(missing)?;
        Ok(home.join(".ghex").join("backup").join("ghex.backup"))
    }
}
