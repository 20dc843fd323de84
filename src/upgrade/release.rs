//! Client for the GitHub-style release API.
//!
//! Metadata is always fetched fresh; nothing is cached between calls. Asset
//! downloads stream straight to a scratch file and report progress per chunk.

use crate::constants::{CHECKSUM_ASSET_NAMES, DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::core::GhexError;
use crate::upgrade::version::Version;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Progress observer for downloads: `(bytes_so_far, total_bytes)`.
///
/// Called synchronously after each chunk, so it must return quickly.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// A published release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Git tag, e.g. `v1.4.0`
    pub tag_name: String,
    /// Human readable title
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Release notes (Markdown)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    /// Publication time, absent for drafts
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Release page on the web
    #[serde(default, deserialize_with = "null_as_empty")]
    pub html_url: String,
    /// Downloadable files attached to the release
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl ReleaseInfo {
    /// The tag parsed as a [`Version`], or `None` for non-version tags.
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        Version::parse(&self.tag_name).ok()
    }

    /// Release title, falling back to the tag when the title is empty.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.tag_name } else { &self.name }
    }
}

/// A file attached to a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// File name, e.g. `ghex-linux-amd64.tar.gz`
    pub name: String,
    /// Direct download URL
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    /// Size in bytes as reported by the API (0 when unknown)
    #[serde(default)]
    pub size: u64,
    /// MIME type reported by the API
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content_type: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// HTTP client for release metadata and asset downloads.
///
/// ```rust,no_run
/// use ghex_cli::upgrade::ReleaseClient;
///
/// # async fn example() -> Result<(), ghex_cli::core::GhexError> {
/// let client = ReleaseClient::github()?;
/// let latest = client.get_latest_release("dwirx", "ghex").await?;
/// println!("latest is {}", latest.tag_name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ReleaseClient {
    /// Create a client against `base_url` with a per-request metadata timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::NetworkError`] if the TLS backend cannot be initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GhexError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| GhexError::NetworkError {
                operation: "building HTTP client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Client for the public GitHub API with the default timeout.
    ///
    /// # Errors
    ///
    /// See [`ReleaseClient::new`].
    pub fn github() -> Result<Self, GhexError> {
        Self::new(DEFAULT_API_URL, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        operation: &str,
        owner: &str,
        repo: &str,
    ) -> Result<T, GhexError> {
        debug!("GET {}", url);
        let network = |reason: String| GhexError::NetworkError {
            operation: operation.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(GhexError::ReleaseNotFound {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                });
            }
            status => return Err(network(format!("unexpected HTTP status {status}"))),
        }

        response.json::<T>().await.map_err(|e| network(format!("invalid response body: {e}")))
    }

    /// Fetch the newest published release.
    ///
    /// # Errors
    ///
    /// - [`GhexError::ReleaseNotFound`] on HTTP 404 (the repository has no releases)
    /// - [`GhexError::NetworkError`] on transport failure, any other non-2xx status,
    ///   or an unparsable body
    pub async fn get_latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo, GhexError> {
        let url = format!("{}/repos/{owner}/{repo}/releases/latest", self.base_url);
        self.get_json(&url, "fetching latest release", owner, repo).await
    }

    /// Fetch the release for a specific tag.
    ///
    /// # Errors
    ///
    /// Same as [`get_latest_release`](Self::get_latest_release).
    pub async fn get_release_by_tag(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<ReleaseInfo, GhexError> {
        let url = format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.base_url);
        self.get_json(&url, &format!("fetching release {tag}"), owner, repo).await
    }

    /// Fetch up to `limit` recent releases, newest first as returned by the API.
    ///
    /// # Errors
    ///
    /// Same as [`get_latest_release`](Self::get_latest_release).
    pub async fn get_releases(
        &self,
        owner: &str,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<ReleaseInfo>, GhexError> {
        let url = format!("{}/repos/{owner}/{repo}/releases?per_page={limit}", self.base_url);
        let mut releases: Vec<ReleaseInfo> =
            self.get_json(&url, "fetching release list", owner, repo).await?;
        releases.truncate(limit);
        Ok(releases)
    }

    /// Stream an asset to `dest`, truncating any existing file.
    ///
    /// When the total size is known (the `Content-Length` header, else a
    /// non-zero [`Asset::size`]) `on_progress` is called after every chunk.
    /// When it is unknown the callback is never called. The write is not
    /// atomic; `dest` is expected to live in a scratch directory.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::DownloadFailed`] on transport errors, non-2xx
    /// statuses and local write failures.
    pub async fn download_asset(
        &self,
        asset: &Asset,
        dest: &Path,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<(), GhexError> {
        info!("Downloading {} to {}", asset.name, dest.display());
        let failed = |reason: String| GhexError::DownloadFailed {
            asset: asset.name.clone(),
            reason,
        };

        let response = self
            .client
            .get(&asset.download_url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        let total = response
            .content_length()
            .filter(|len| *len > 0)
            .or_else(|| (asset.size > 0).then_some(asset.size));

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| failed(format!("cannot create {}: {e}", dest.display())))?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| failed(format!("connection interrupted: {e}")))?;
            file.write_all(&chunk).await.map_err(|e| failed(format!("write error: {e}")))?;
            downloaded += chunk.len() as u64;

            if let (Some(total), Some(callback)) = (total, on_progress) {
                callback(downloaded, total);
            }
        }

        file.flush().await.map_err(|e| failed(format!("write error: {e}")))?;
        debug!("Downloaded {} bytes of {}", downloaded, asset.name);
        Ok(())
    }

    /// Fetch the release's checksum manifest as text.
    ///
    /// Looks for an asset named exactly `checksums.txt`, `SHA256SUMS` or
    /// `sha256sums.txt`. Returns an empty string when none is attached.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::DownloadFailed`] when a manifest exists but cannot
    /// be fetched.
    pub async fn download_checksum_manifest(
        &self,
        release: &ReleaseInfo,
    ) -> Result<String, GhexError> {
        let Some(asset) = CHECKSUM_ASSET_NAMES
            .iter()
            .find_map(|name| release.assets.iter().find(|a| a.name == *name))
        else {
            debug!("Release {} has no checksum manifest", release.tag_name);
            return Ok(String::new());
        };

        let failed = |reason: String| GhexError::DownloadFailed {
            asset: asset.name.clone(),
            reason,
        };

        let response = self
            .client
            .get(&asset.download_url)
            .header(ACCEPT, "application/octet-stream")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        response.text().await.map_err(|e| failed(e.to_string()))
    }
}
