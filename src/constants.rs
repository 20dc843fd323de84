//! Global constants used throughout the ghex codebase.
//!
//! Timeouts, retry parameters and release coordinates shared by the updater,
//! the configuration defaults and the CLI.

use std::time::Duration;

/// Name of the installed executable and prefix of every release asset.
pub const BINARY_NAME: &str = "ghex";

/// GitHub account that publishes ghex releases.
pub const DEFAULT_REPO_OWNER: &str = "dwirx";

/// Repository that publishes ghex releases.
pub const DEFAULT_REPO_NAME: &str = "ghex";

/// Base URL of the release API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// `User-Agent` sent with every release API request.
pub const USER_AGENT: &str = "ghex-updater";

/// Per-request HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Extra download attempts after the first one fails.
pub const DEFAULT_DOWNLOAD_RETRIES: usize = 2;

/// Number of releases fetched when building a changelog.
pub const CHANGELOG_RELEASE_LIMIT: usize = 20;

/// Asset names recognised as a SHA-256 checksum manifest, in lookup order.
pub const CHECKSUM_ASSET_NAMES: &[&str] = &["checksums.txt", "SHA256SUMS", "sha256sums.txt"];

/// How long to wait for another ghex process to release the update lock.
pub fn default_lock_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Maximum backoff delay for exponential backoff (500ms).
///
/// Exponential backoff delays are capped at this value to prevent
/// excessive wait times during lock polling.
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// First delay between download attempts.
pub const DOWNLOAD_RETRY_BASE_MS: u64 = 250;

/// Cap on the delay between download attempts.
pub const DOWNLOAD_RETRY_MAX_DELAY: Duration = Duration::from_secs(4);
