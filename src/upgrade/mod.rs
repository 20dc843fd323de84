//! Self-update functionality for ghex.
//!
//! This module lets ghex replace itself with a newer release published on
//! GitHub, without ever leaving the installation half-written.
//!
//! # Architecture Overview
//!
//! Leaves first:
//!
//! - [`version`]: parses and orders release tags
//! - [`verification`]: SHA-256 hashing and checksum manifests
//! - [`release`]: release metadata and streaming asset downloads
//! - [`platform`]: maps the running OS/arch to a release asset
//! - [`binary`] and [`replace`]: backup, restore and the per-platform swap
//! - [`archive`], [`lock`], [`permissions`]: extraction, the cross-process
//!   update lock and permission diagnostics
//! - [`self_updater`]: the [`Updater`] that ties it all together
//!
//! ## Update Process Flow
//!
//! ```text
//! 1. Check
//!    └── GET /repos/{owner}/{repo}/releases/latest, compare versions
//!
//! 2. Prepare (installed binary untouched)
//!    ├── Check write permission on the install directory
//!    ├── Select the platform asset
//!    ├── Download into a temporary directory (with retries)
//!    ├── Verify against checksums.txt / SHA256SUMS when present
//!    └── Extract the binary from .tar.gz / .zip
//!
//! 3. Install (under the update lock)
//!    ├── Back up the current binary (single generation)
//!    ├── Replace: unlink + copy on Unix, deferred script on Windows
//!    └── Restore the backup if the replace fails
//! ```
//!
//! # Usage
//!
//! ```bash
//! ghex update --check       # Report whether a newer release exists
//! ghex update --changelog   # Show release notes since the current version
//! ghex update               # Download and install the latest release
//! ghex update --rollback    # Restore the previous binary
//! ```

pub mod archive;
pub mod binary;
pub mod config;
pub mod lock;
pub mod permissions;
pub mod platform;
pub mod release;
pub mod replace;
pub mod self_updater;
pub mod verification;
pub mod version;

pub use binary::{BackupInfo, BinaryManager};
pub use config::UpgradeConfig;
pub use release::{Asset, ProgressFn, ReleaseClient, ReleaseInfo};
pub use replace::{DeferredSwapReplace, ReplaceOutcome, ReplaceStrategy, UnlinkReplace};
pub use self_updater::{Updater, format_changelog};
pub use verification::{ChecksumEntry, ChecksumVerifier};
pub use version::{Version, compare_version_strings};
