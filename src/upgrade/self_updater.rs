use crate::constants::{
    BINARY_NAME, CHANGELOG_RELEASE_LIMIT, DEFAULT_DOWNLOAD_RETRIES, DEFAULT_REPO_NAME,
    DEFAULT_REPO_OWNER, DOWNLOAD_RETRY_BASE_MS, DOWNLOAD_RETRY_MAX_DELAY,
};
use crate::core::GhexError;
use crate::upgrade::archive::{ArchiveFormat, extract_binary};
use crate::upgrade::binary::BinaryManager;
use crate::upgrade::config::UpgradeConfig;
use crate::upgrade::lock::{LockPurpose, UpdateLock};
use crate::upgrade::platform::{current_platform, select_asset};
use crate::upgrade::release::{Asset, ProgressFn, ReleaseClient, ReleaseInfo};
use crate::upgrade::replace::ReplaceOutcome;
use crate::upgrade::verification::ChecksumVerifier;
use crate::upgrade::version::Version;
use std::path::Path;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

/// Orchestrates checking for, downloading and installing ghex releases.
///
/// `Updater` keeps no state between calls: every check re-fetches the remote
/// release list. An update runs these steps in order and stops at the first
/// failure:
///
/// 1. Verify the install directory is writable
/// 2. Select the asset for the configured platform
/// 3. Download it into a scoped temporary directory (retried with backoff)
/// 4. Verify it against the release's checksum manifest, when present
/// 5. Extract the binary from the archive
/// 6. Take the update lock and back up the installed binary
/// 7. Replace the binary, restoring the backup if that fails
///
/// Steps 1 through 5 never touch the installed binary.
///
/// # Examples
///
/// ```rust,no_run
/// use ghex_cli::upgrade::Updater;
///
/// # async fn example() -> Result<(), ghex_cli::core::GhexError> {
/// let updater = Updater::with_defaults(env!("CARGO_PKG_VERSION"))?;
/// let (release, has_update) = updater.check_for_update().await?;
/// if has_update {
///     updater.update(&release, None).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Updater {
    current_version: String,
    repo_owner: String,
    repo_name: String,
    binary_name: String,
    os: String,
    arch: String,
    verify_checksum: bool,
    download_retries: usize,
    client: ReleaseClient,
    binary: BinaryManager,
}

impl Updater {
    /// Updater for the ghex repository on the running platform.
    #[must_use]
    pub fn new(current_version: impl Into<String>, client: ReleaseClient, binary: BinaryManager) -> Self {
        let (os, arch) = current_platform();
        Self {
            current_version: current_version.into(),
            repo_owner: DEFAULT_REPO_OWNER.to_string(),
            repo_name: DEFAULT_REPO_NAME.to_string(),
            binary_name: BINARY_NAME.to_string(),
            os,
            arch,
            verify_checksum: true,
            download_retries: DEFAULT_DOWNLOAD_RETRIES,
            client,
            binary,
        }
    }

    /// Updater for the running executable against the public GitHub API.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client or the binary paths cannot be set up.
    pub fn with_defaults(current_version: impl Into<String>) -> Result<Self, GhexError> {
        Self::from_config(current_version, &UpgradeConfig::default())
    }

    /// Updater for the running executable using the `[upgrade]` settings.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client or the binary paths cannot be set up.
    pub fn from_config(
        current_version: impl Into<String>,
        config: &UpgradeConfig,
    ) -> Result<Self, GhexError> {
        let client = ReleaseClient::new(&config.api_url, config.timeout())?;
        Ok(Self::new(current_version, client, BinaryManager::new()?)
            .with_repo(&config.repo_owner, &config.repo_name)
            .with_checksum_verification(config.verify_checksum)
            .with_download_retries(config.download_retries))
    }

    /// Use a different release repository.
    #[must_use]
    pub fn with_repo(mut self, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        self.repo_owner = owner.into();
        self.repo_name = repo.into();
        self
    }

    /// Use a different binary name for asset selection and extraction.
    #[must_use]
    pub fn with_binary_name(mut self, name: impl Into<String>) -> Self {
        self.binary_name = name.into();
        self
    }

    /// Target another platform, in release naming (`linux`, `amd64`, ...).
    #[must_use]
    pub fn with_platform(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.os = os.into();
        self.arch = arch.into();
        self
    }

    /// Enable or disable checksum manifest verification.
    #[must_use]
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    /// Extra download attempts after a failed one.
    #[must_use]
    pub fn with_download_retries(mut self, retries: usize) -> Self {
        self.download_retries = retries;
        self
    }

    /// Version string this updater compares against.
    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Target `(os, arch)`.
    #[must_use]
    pub fn platform(&self) -> (&str, &str) {
        (&self.os, &self.arch)
    }

    /// The binary manager in use.
    #[must_use]
    pub fn binary_manager(&self) -> &BinaryManager {
        &self.binary
    }

    /// Fetch the latest release and report whether it is newer than the
    /// current version. Writes nothing to disk.
    ///
    /// # Errors
    ///
    /// - [`GhexError::InvalidVersion`] if either the current version or the
    ///   remote tag is malformed
    /// - network errors from [`ReleaseClient::get_latest_release`], unchanged
    pub async fn check_for_update(&self) -> Result<(ReleaseInfo, bool), GhexError> {
        debug!("Checking for updates from {}/{}", self.repo_owner, self.repo_name);
        let current = Version::parse(&self.current_version)?;

        let release = self.client.get_latest_release(&self.repo_owner, &self.repo_name).await?;
        let latest = Version::parse(&release.tag_name)?;
        let has_update = latest.is_newer_than(&current);

        if has_update {
            info!("Update available: {} -> {}", current, latest);
        } else {
            debug!("Already on latest version {}", current);
        }
        Ok((release, has_update))
    }

    /// Fetch the release for a specific tag.
    ///
    /// # Errors
    ///
    /// Errors from [`ReleaseClient::get_release_by_tag`].
    pub async fn get_release(&self, tag: &str) -> Result<ReleaseInfo, GhexError> {
        self.client.get_release_by_tag(&self.repo_owner, &self.repo_name, tag).await
    }

    /// Install `release` over the current binary.
    ///
    /// Progress is forwarded from the download. On Windows the result is
    /// [`ReplaceOutcome::Deferred`] and the swap happens after ghex exits.
    ///
    /// # Errors
    ///
    /// - [`GhexError::PermissionDenied`] before anything is downloaded
    /// - [`GhexError::AssetNotFound`], [`GhexError::DownloadFailed`],
    ///   [`GhexError::ChecksumMismatch`], [`GhexError::ExtractFailed`],
    ///   [`GhexError::BackupFailed`] with the installed binary untouched
    /// - [`GhexError::ReplaceFailed`] after a successful automatic restore
    /// - [`GhexError::ReplaceAndRestoreFailed`] when the restore failed too
    pub async fn update(
        &self,
        release: &ReleaseInfo,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<ReplaceOutcome, GhexError> {
        info!("Updating to {}", release.tag_name);
        self.binary.check_write_permission().await?;

        let asset = select_asset(release, &self.binary_name, &self.os, &self.arch)?;

        // Removed on every exit path when dropped
        let workdir = tempfile::Builder::new().prefix("ghex-update-").tempdir()?;
        let archive = workdir.path().join(&asset.name);

        self.download_with_retry(asset, &archive, on_progress).await?;

        if self.verify_checksum {
            self.verify_download(release, asset, &archive).await?;
        }

        let extract_dir = workdir.path().join("extracted");
        tokio::fs::create_dir_all(&extract_dir).await?;
        let new_binary = extract_binary(
            &archive,
            ArchiveFormat::from_name(&asset.name),
            &self.binary_name,
            &self.os,
            &extract_dir,
        )
        .await?;

        let outcome = self.install(&new_binary).await?;
        info!("Update to {} finished ({:?})", release.tag_name, outcome);
        Ok(outcome)
    }

    async fn download_with_retry(
        &self,
        asset: &Asset,
        dest: &Path,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<(), GhexError> {
        let strategy = ExponentialBackoff::from_millis(DOWNLOAD_RETRY_BASE_MS)
            .max_delay(DOWNLOAD_RETRY_MAX_DELAY)
            .take(self.download_retries);

        let client = &self.client;
        Retry::spawn(strategy, move || async move {
            let result = client.download_asset(asset, dest, on_progress).await;
            if let Err(e) = &result {
                warn!("Download attempt failed: {}", e);
            }
            result
        })
        .await
    }

    /// Opportunistic verification: a missing or unreachable manifest, or one
    /// without an entry for this asset, skips the check.
    async fn verify_download(
        &self,
        release: &ReleaseInfo,
        asset: &Asset,
        archive: &Path,
    ) -> Result<(), GhexError> {
        let manifest = match self.client.download_checksum_manifest(release).await {
            Ok(text) if text.trim().is_empty() => {
                debug!("No checksum manifest in {}, skipping verification", release.tag_name);
                return Ok(());
            }
            Ok(text) => text,
            Err(e) => {
                warn!("Could not fetch checksum manifest, skipping verification: {}", e);
                return Ok(());
            }
        };

        let entries = ChecksumVerifier::parse_manifest(&manifest);
        match ChecksumVerifier::find_checksum(&entries, &asset.name) {
            Some(expected) => ChecksumVerifier::verify(archive, &expected).await,
            None => {
                warn!("Checksum manifest has no entry for {}", asset.name);
                Ok(())
            }
        }
    }

    /// Backup, then replace; restore once if the replace fails.
    async fn install(&self, new_binary: &Path) -> Result<ReplaceOutcome, GhexError> {
        let _lock = UpdateLock::acquire(self.binary.backup_dir(), LockPurpose::Update).await?;

        self.binary.backup().await?;

        match self.binary.replace(new_binary).await {
            Ok(outcome) => Ok(outcome),
            Err(replace_error) => {
                warn!("Replace failed, restoring backup: {}", replace_error);
                match self.binary.restore().await {
                    Ok(()) => Err(replace_error),
                    Err(restore_error) => Err(GhexError::ReplaceAndRestoreFailed {
                        replace: Box::new(replace_error),
                        restore: Box::new(restore_error),
                    }),
                }
            }
        }
    }

    /// Restore the backup over the installed binary.
    ///
    /// # Errors
    ///
    /// [`GhexError::NoBackupAvailable`], [`GhexError::RestoreFailed`] or
    /// [`GhexError::LockTimeout`].
    pub async fn rollback(&self) -> Result<(), GhexError> {
        let _lock = UpdateLock::acquire(self.binary.backup_dir(), LockPurpose::Rollback).await?;
        self.binary.restore().await
    }

    /// Whether a backup exists.
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.binary.has_backup()
    }

    /// Releases newer than `from_version`, newest first.
    ///
    /// Looks at the 20 most recent releases. Tags that are not versions are
    /// skipped.
    ///
    /// # Errors
    ///
    /// [`GhexError::InvalidVersion`] for a malformed `from_version`, plus
    /// errors from [`ReleaseClient::get_releases`].
    pub async fn get_changelog(&self, from_version: &str) -> Result<Vec<ReleaseInfo>, GhexError> {
        let from = Version::parse(from_version)?;
        let releases = self
            .client
            .get_releases(&self.repo_owner, &self.repo_name, CHANGELOG_RELEASE_LIMIT)
            .await?;

        Ok(releases
            .into_iter()
            .filter(|release| match release.version() {
                Some(version) => version.is_newer_than(&from),
                None => {
                    debug!("Skipping non-version tag {}", release.tag_name);
                    false
                }
            })
            .collect())
    }
}

/// Render releases as Markdown sections, or `No changes found.` for none.
#[must_use]
pub fn format_changelog(releases: &[ReleaseInfo]) -> String {
    if releases.is_empty() {
        return "No changes found.".to_string();
    }

    let mut out = String::new();
    for release in releases {
        out.push_str(&format!("\n## {} ({})\n", release.display_name(), release.tag_name));
        out.push_str(&release.body);
        out.push('\n');
    }
    out
}
