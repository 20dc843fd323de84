//! Error handling for ghex
//!
//! This module provides the error taxonomy of the self-update subsystem and the
//! user-friendly error reporting used by the CLI. The error system is built on
//! two principles:
//! 1. **Strongly-typed errors** with structured fields, so callers can branch
//!    on the failure (for example, offer a rollback only after a replace failure)
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`GhexError`] - Enumerated error types for every update failure mode
//! - [`ErrorContext`] - Wrapper that adds user-facing details and suggestions
//!
//! Use [`user_friendly_error`] to turn any [`anyhow::Error`] into an
//! [`ErrorContext`] ready for display.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ghex_cli::core::{GhexError, user_friendly_error};
//!
//! let error = GhexError::NoBackupAvailable {
//!     path: "/home/me/.ghex/backup/ghex.backup".into(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error with a suggestion
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for ghex update operations.
///
/// Every variant carries the context needed to act on it: which path, which
/// asset, which expected and actual hash. Variants are grouped as follows.
///
/// ## Discovery
/// - [`InvalidVersion`] - A version string does not match `v?MAJOR.MINOR.PATCH(-PRE)?`
/// - [`NetworkError`] - Transport failure or unexpected HTTP status from the release API
/// - [`ReleaseNotFound`] - The repository has no (matching) release
/// - [`AssetNotFound`] - No asset matches the running platform
/// - [`NoUpdateAvailable`] - Already on the latest version
///
/// ## Download and verification
/// - [`DownloadFailed`] - Asset bytes could not be fetched or written
/// - [`ChecksumMismatch`] - Downloaded content does not match the manifest
/// - [`ExtractFailed`] - The archive is unreadable or does not contain the binary
///
/// ## Installation
/// - [`PermissionDenied`] - The install directory is not writable
/// - [`BackupFailed`] - The safety copy could not be written
/// - [`ReplaceFailed`] - The new binary could not be put in place
/// - [`ReplaceAndRestoreFailed`] - Replace failed and the automatic restore failed too
/// - [`RestoreFailed`] - The backup could not be copied back
/// - [`NoBackupAvailable`] - Rollback requested without a backup
/// - [`LockTimeout`] - Another ghex process holds the update lock
///
/// [`InvalidVersion`]: GhexError::InvalidVersion
/// [`NetworkError`]: GhexError::NetworkError
/// [`ReleaseNotFound`]: GhexError::ReleaseNotFound
/// [`AssetNotFound`]: GhexError::AssetNotFound
/// [`NoUpdateAvailable`]: GhexError::NoUpdateAvailable
/// [`DownloadFailed`]: GhexError::DownloadFailed
/// [`ChecksumMismatch`]: GhexError::ChecksumMismatch
/// [`ExtractFailed`]: GhexError::ExtractFailed
/// [`PermissionDenied`]: GhexError::PermissionDenied
/// [`BackupFailed`]: GhexError::BackupFailed
/// [`ReplaceFailed`]: GhexError::ReplaceFailed
/// [`ReplaceAndRestoreFailed`]: GhexError::ReplaceAndRestoreFailed
/// [`RestoreFailed`]: GhexError::RestoreFailed
/// [`NoBackupAvailable`]: GhexError::NoBackupAvailable
/// [`LockTimeout`]: GhexError::LockTimeout
#[derive(Error, Debug)]
pub enum GhexError {
    /// A version string could not be parsed.
    #[error("Invalid version format: '{version}'")]
    InvalidVersion {
        /// The offending input
        version: String,
    },

    /// Network error while talking to the release API.
    #[error("Network error while {operation}: {reason}")]
    NetworkError {
        /// What was being attempted (e.g. "fetching latest release")
        operation: String,
        /// Underlying transport error or HTTP status
        reason: String,
    },

    /// No release exists for the repository (HTTP 404).
    #[error("No releases found for {owner}/{repo}")]
    ReleaseNotFound {
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
    },

    /// No release asset matches the target platform.
    #[error("No compatible asset found for platform {os}/{arch}")]
    AssetNotFound {
        /// Target operating system (`linux`, `darwin`, `windows`)
        os: String,
        /// Target architecture (`amd64`, `arm64`)
        arch: String,
    },

    /// The running binary is already the latest version.
    #[error("Already running the latest version ({current})")]
    NoUpdateAvailable {
        /// Version currently installed
        current: String,
    },

    /// An asset could not be downloaded.
    #[error("Failed to download '{asset}': {reason}")]
    DownloadFailed {
        /// Asset name
        asset: String,
        /// HTTP status or I/O error
        reason: String,
    },

    /// A file's SHA-256 does not match the expected value.
    #[error(
        "Checksum verification failed for {}: expected {expected}, got {actual} (possible security issue)",
        path.display()
    )]
    ChecksumMismatch {
        /// File that was verified
        path: PathBuf,
        /// Digest from the manifest
        expected: String,
        /// Digest computed from the file
        actual: String,
    },

    /// The downloaded archive could not be extracted.
    #[error("Failed to extract {}: {reason}", archive.display())]
    ExtractFailed {
        /// Archive path
        archive: PathBuf,
        /// Why extraction failed
        reason: String,
    },

    /// The install location is not writable.
    #[error("Insufficient permissions to update {}", path.display())]
    PermissionDenied {
        /// Binary path that could not be written
        path: PathBuf,
        /// Platform-specific instructions for the user
        instruction: String,
    },

    /// The backup copy could not be created.
    #[error("Failed to create backup at {}: {reason}", path.display())]
    BackupFailed {
        /// Backup destination
        path: PathBuf,
        /// Underlying I/O error
        reason: String,
    },

    /// The new binary could not be put in place.
    #[error("Failed to replace binary at {}: {reason}", path.display())]
    ReplaceFailed {
        /// Installed binary path
        path: PathBuf,
        /// Underlying I/O error
        reason: String,
    },

    /// Replace failed and the automatic restore failed as well.
    ///
    /// The installation may be inconsistent; both errors are kept so the user
    /// sees what happened and what did not get undone.
    #[error("{replace}; automatic restore also failed: {restore}")]
    ReplaceAndRestoreFailed {
        /// The original replace error
        replace: Box<GhexError>,
        /// The error from the recovery attempt
        restore: Box<GhexError>,
    },

    /// Restoring from backup failed.
    #[error("Failed to restore {} from backup: {reason}", path.display())]
    RestoreFailed {
        /// Binary path being restored
        path: PathBuf,
        /// Underlying I/O error
        reason: String,
    },

    /// There is no backup to roll back to.
    #[error("No backup available for rollback (expected at {})", path.display())]
    NoBackupAvailable {
        /// Where the backup was expected
        path: PathBuf,
    },

    /// Another process holds the update lock.
    #[error("Timed out after {seconds}s waiting for update lock {} to {operation}", path.display())]
    LockTimeout {
        /// What the lock was wanted for (`update`, `rollback`)
        operation: String,
        /// Lock file path
        path: PathBuf,
        /// How long we waited
        seconds: u64,
    },

    /// Configuration file problem.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl GhexError {
    /// Whether the error happened while swapping the binary.
    ///
    /// Only these failures can leave the installation in a changed state, so
    /// the CLI offers `--rollback` for them and not for download-time errors.
    #[must_use]
    pub const fn is_replace_class(&self) -> bool {
        matches!(self, Self::ReplaceFailed { .. } | Self::ReplaceAndRestoreFailed { .. })
    }
}

impl Clone for GhexError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidVersion {
                version,
            } => Self::InvalidVersion {
                version: version.clone(),
            },
            Self::NetworkError {
                operation,
                reason,
            } => Self::NetworkError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::ReleaseNotFound {
                owner,
                repo,
            } => Self::ReleaseNotFound {
                owner: owner.clone(),
                repo: repo.clone(),
            },
            Self::AssetNotFound {
                os,
                arch,
            } => Self::AssetNotFound {
                os: os.clone(),
                arch: arch.clone(),
            },
            Self::NoUpdateAvailable {
                current,
            } => Self::NoUpdateAvailable {
                current: current.clone(),
            },
            Self::DownloadFailed {
                asset,
                reason,
            } => Self::DownloadFailed {
                asset: asset.clone(),
                reason: reason.clone(),
            },
            Self::ChecksumMismatch {
                path,
                expected,
                actual,
            } => Self::ChecksumMismatch {
                path: path.clone(),
                expected: expected.clone(),
                actual: actual.clone(),
            },
            Self::ExtractFailed {
                archive,
                reason,
            } => Self::ExtractFailed {
                archive: archive.clone(),
                reason: reason.clone(),
            },
            Self::PermissionDenied {
                path,
                instruction,
            } => Self::PermissionDenied {
                path: path.clone(),
                instruction: instruction.clone(),
            },
            Self::BackupFailed {
                path,
                reason,
            } => Self::BackupFailed {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ReplaceFailed {
                path,
                reason,
            } => Self::ReplaceFailed {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ReplaceAndRestoreFailed {
                replace,
                restore,
            } => Self::ReplaceAndRestoreFailed {
                replace: replace.clone(),
                restore: restore.clone(),
            },
            Self::RestoreFailed {
                path,
                reason,
            } => Self::RestoreFailed {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::NoBackupAvailable {
                path,
            } => Self::NoBackupAvailable {
                path: path.clone(),
            },
            Self::LockTimeout {
                operation,
                path,
                seconds,
            } => Self::LockTimeout {
                operation: operation.clone(),
                path: path.clone(),
                seconds: *seconds,
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // io::Error is not Clone; keep the kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// `ErrorContext` wraps a [`GhexError`] and adds optional details (yellow) and a
/// suggestion (green) for terminal display.
///
/// ```rust,no_run
/// use ghex_cli::core::{ErrorContext, GhexError};
///
/// let context = ErrorContext::new(GhexError::NoUpdateAvailable {
///     current: "1.0.0".to_string(),
/// })
/// .with_suggestion("Use --force to reinstall");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying ghex error
    pub error: GhexError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: GhexError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes, in order:
/// - [`GhexError`] anywhere in the chain, with tailored suggestions
/// - [`std::io::Error`] permission and not-found kinds
/// - [`toml::de::Error`] from the settings file
/// - Anything else, rendered with its full cause chain
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(ghex_error) = error.chain().find_map(|e| e.downcast_ref::<GhexError>()) {
        return create_error_context(ghex_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(GhexError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Try running with elevated permissions (sudo/Administrator) or check file ownership");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(GhexError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(GhexError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in ~/.ghex/config.toml");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(GhexError::Other {
        message,
    })
}

/// Map each [`GhexError`] variant to suggestions and details.
fn create_error_context(error: GhexError) -> ErrorContext {
    match &error {
        GhexError::InvalidVersion {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Use a version like 1.2.3 or v1.2.3-rc.1")
            .with_details("Versions must be MAJOR.MINOR.PATCH with an optional -PRERELEASE suffix"),
        GhexError::NetworkError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection and try again")
            .with_details("GitHub may also be rate limiting unauthenticated requests"),
        GhexError::ReleaseNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the repo_owner and repo_name under [upgrade] in ~/.ghex/config.toml"),
        GhexError::AssetNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Download a build for your platform manually from the GitHub releases page"),
        GhexError::DownloadFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Retry the update; the installed binary was not modified"),
        GhexError::ChecksumMismatch {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Do not install this file. Retry later or download manually and verify it")
            .with_details("The installed binary was not modified"),
        GhexError::ExtractFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("The release archive may be corrupt; retry or download manually"),
        GhexError::PermissionDenied {
            instruction,
            ..
        } => {
            let instruction = instruction.clone();
            let context = ErrorContext::new(error).with_details(instruction);
            match crate::upgrade::permissions::suggested_install_path() {
                Some(dir) => context.with_suggestion(format!(
                    "Installing ghex under {} avoids elevated permissions",
                    dir.display()
                )),
                None => context,
            }
        }
        GhexError::BackupFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Free some disk space or check permissions on ~/.ghex/backup")
            .with_details("The update was aborted before touching the installed binary"),
        GhexError::ReplaceFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'ghex update --rollback' if ghex no longer starts"),
        GhexError::ReplaceAndRestoreFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Reinstall ghex manually from the GitHub releases page")
            .with_details("The installation may be in an inconsistent state"),
        GhexError::RestoreFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check permissions on the install directory and retry the rollback"),
        GhexError::NoBackupAvailable {
            ..
        } => ErrorContext::new(error)
            .with_details("A backup is only created when an update is installed"),
        GhexError::NoUpdateAvailable {
            ..
        } => ErrorContext::new(error),
        GhexError::LockTimeout {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Wait for the other ghex update to finish and try again"),
        GhexError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax in ~/.ghex/config.toml"),
        GhexError::IoError(_) | GhexError::Other {
            ..
        } => ErrorContext::new(error),
    }
}
