//! Diagnostics for install locations the current user cannot write to.

use crate::core::GhexError;
use std::path::{Path, PathBuf};

/// Directory prefixes that normally require root on Unix.
const SYSTEM_PATH_PREFIXES: &[&str] = &["/usr/local/bin", "/usr/bin", "/bin", "/opt", "/usr/local"];

/// Whether `dir` lives under a root-owned system prefix.
#[must_use]
pub fn is_system_path(dir: &Path) -> bool {
    SYSTEM_PATH_PREFIXES.iter().any(|prefix| dir.starts_with(prefix))
}

/// Build the user-facing instructions for an unwritable `binary_path`.
///
/// `os` uses release naming (`windows`, `linux`, `darwin`).
#[must_use]
pub fn permission_instruction(binary_path: &Path, os: &str) -> String {
    let dir = binary_path.parent().unwrap_or(binary_path).display().to_string();

    if os == "windows" {
        return format!(
            "Cannot write to {dir}\n\n\
             Please try one of the following:\n\
             1. Run the command prompt as Administrator\n\
             2. Move ghex to a user-writable location\n\
             3. Manually download the update from GitHub releases"
        );
    }

    if binary_path.parent().is_some_and(is_system_path) {
        return format!(
            "Cannot write to {dir} (requires elevated permissions)\n\n\
             Please try one of the following:\n\
             1. Run with sudo: sudo ghex update\n\
             2. Move ghex to a user-writable location (e.g., ~/.local/bin)\n\
             3. Manually download the update from GitHub releases"
        );
    }

    format!(
        "Cannot write to {dir}\n\n\
         Please check the directory permissions or try:\n\
         chmod u+w {dir}"
    )
}

/// [`GhexError::PermissionDenied`] for `binary_path` with instructions for the
/// running platform.
#[must_use]
pub fn permission_error(binary_path: &Path) -> GhexError {
    let (os, _) = crate::upgrade::platform::current_platform();
    GhexError::PermissionDenied {
        path: binary_path.to_path_buf(),
        instruction: permission_instruction(binary_path, &os),
    }
}

/// A user-writable directory ghex can be installed to without elevation.
///
/// `%LOCALAPPDATA%\Programs\ghex` on Windows, `~/.local/bin` elsewhere.
#[must_use]
pub fn suggested_install_path() -> Option<PathBuf> {
    if cfg!(windows) {
        dirs::data_local_dir().map(|dir| dir.join("Programs").join("ghex"))
    } else {
        dirs::home_dir().map(|home| home.join(".local").join("bin"))
    }
}
