//! Platform strategies for swapping the installed executable.
//!
//! Unix lets a running executable be unlinked: open handles stay valid and the
//! path is free for the new file. Windows refuses even that, so the swap is
//! handed to a detached batch script that retries until this process exits.

use crate::core::GhexError;
use std::ffi::OsString;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// What a replace actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The new binary is in place now.
    Replaced,
    /// A helper will move the new binary into place after this process exits.
    Deferred,
}

/// Puts a new executable at the install path.
pub trait ReplaceStrategy: Debug + Send + Sync {
    /// Replace `target` with the content of `new_binary`.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::ReplaceFailed`] when the swap cannot be performed
    /// or scheduled.
    fn replace(&self, target: &Path, new_binary: &Path) -> Result<ReplaceOutcome, GhexError>;

    /// Whether `new_binary` must still exist after this process exits.
    ///
    /// When `true` the caller stages the file beside the target first instead
    /// of passing a path inside a temporary directory.
    fn needs_staging(&self) -> bool {
        false
    }
}

/// Strategy for the platform this binary was built for.
#[must_use]
pub fn default_strategy() -> Arc<dyn ReplaceStrategy> {
    if cfg!(windows) { Arc::new(DeferredSwapReplace) } else { Arc::new(UnlinkReplace) }
}

fn replace_failed(target: &Path, reason: impl std::fmt::Display) -> GhexError {
    GhexError::ReplaceFailed {
        path: target.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Remove the old file, copy the new one in, mark it executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlinkReplace;

impl ReplaceStrategy for UnlinkReplace {
    fn replace(&self, target: &Path, new_binary: &Path) -> Result<ReplaceOutcome, GhexError> {
        debug!("Replacing {} with {}", target.display(), new_binary.display());

        match std::fs::remove_file(target) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(replace_failed(target, format!("cannot remove old binary: {e}"))),
        }

        std::fs::copy(new_binary, target)
            .map_err(|e| replace_failed(target, format!("cannot copy new binary: {e}")))?;

        set_executable(target).map_err(|e| replace_failed(target, e))?;

        info!("Replaced {}", target.display());
        Ok(ReplaceOutcome::Replaced)
    }
}

/// Hand the swap to a detached, self-deleting batch script.
///
/// The script polls once a second until `move /y` succeeds, which happens as
/// soon as the running ghex exits and releases its image file. `new_binary`
/// must survive this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredSwapReplace;

impl DeferredSwapReplace {
    /// Location of the helper script for `target`: `<target>_update.bat`.
    #[must_use]
    pub fn script_path(target: &Path) -> PathBuf {
        let mut name = OsString::from(target.as_os_str());
        name.push("_update.bat");
        PathBuf::from(name)
    }

    /// Batch script that moves `new_binary` over `target` and deletes itself.
    #[must_use]
    pub fn render_script(target: &Path, new_binary: &Path) -> String {
        [
            "@echo off".to_string(),
            "setlocal".to_string(),
            format!("set \"NEW_BINARY={}\"", new_binary.display()),
            format!("set \"TARGET={}\"", target.display()),
            "set \"SCRIPT=%~f0\"".to_string(),
            ":wait_loop".to_string(),
            "timeout /t 1 /nobreak > nul".to_string(),
            "move /y \"%NEW_BINARY%\" \"%TARGET%\" > nul 2>&1".to_string(),
            "if errorlevel 1 goto wait_loop".to_string(),
            "del \"%SCRIPT%\"".to_string(),
            "endlocal".to_string(),
        ]
        .join("\r\n")
    }
}

impl ReplaceStrategy for DeferredSwapReplace {
    fn replace(&self, target: &Path, new_binary: &Path) -> Result<ReplaceOutcome, GhexError> {
        let script = Self::script_path(target);
        std::fs::write(&script, Self::render_script(target, new_binary))
            .map_err(|e| replace_failed(target, format!("cannot write update script: {e}")))?;

        let launched = std::process::Command::new("cmd")
            .arg("/c")
            .arg("start")
            .arg("/b")
            .arg("")
            .arg(&script)
            .spawn();

        if let Err(e) = launched {
            let _ = std::fs::remove_file(&script);
            return Err(replace_failed(target, format!("cannot launch update script: {e}")));
        }

        info!("Scheduled replacement of {} after exit", target.display());
        Ok(ReplaceOutcome::Deferred)
    }

    fn needs_staging(&self) -> bool {
        true
    }
}

/// Set mode 0755 on Unix; no-op elsewhere.
pub(crate) fn set_executable(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
