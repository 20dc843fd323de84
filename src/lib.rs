//! ghex - self-update engine for the ghex command-line tool
//!
//! `ghex` switches Git identities and downloads files from Git forges. This
//! crate holds the part of it that keeps the `ghex` binary itself current:
//! it finds the newest GitHub release, downloads the asset for the running
//! platform, verifies its SHA-256 checksum and swaps it in for the installed
//! executable, keeping a backup it can roll back to.
//!
//! # Architecture Overview
//!
//! An update is a straight pipeline, and nothing touches the installed binary
//! before the new one has been downloaded, verified and extracted:
//!
//! ```text
//! check_for_update -> select_asset -> download -> verify -> extract
//!                  -> lock + backup -> replace (restore on failure)
//! ```
//!
//! # Core Modules
//!
//! - [`upgrade`] - Versions, release API client, asset selection, checksum
//!   verification, backup/replace and the [`upgrade::Updater`] tying them together
//! - [`core`] - Error types ([`core::GhexError`]) and user-facing error rendering
//! - [`config`] - Optional settings file (`~/.ghex/config.toml`)
//! - [`cli`] - `ghex update` and `ghex version`
//! - [`utils`] - Progress indicators
//! - [`constants`] - Defaults shared across modules
//!
//! # Example
//!
//! ```rust,no_run
//! use ghex_cli::upgrade::Updater;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let updater = Updater::with_defaults(env!("CARGO_PKG_VERSION"))?;
//! let (release, has_update) = updater.check_for_update().await?;
//! if has_update {
//!     println!("Installing {}", release.tag_name);
//!     updater.update(&release, None).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod upgrade;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
