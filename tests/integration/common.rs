//! Shared fixtures: a fake release API on a local mock server and a sandboxed
//! install location.

use ghex_cli::test_utils::{ReleaseArchive, install_fake_binary};
use ghex_cli::upgrade::{BinaryManager, ReleaseClient, Updater};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OWNER: &str = "dwirx";
pub const REPO: &str = "ghex";
pub const LINUX_ASSET: &str = "ghex-linux-amd64.tar.gz";
pub const ORIGINAL_BINARY: &[u8] = b"ghex 1.0.0 original";

/// A scratch install: `bin/ghex` plus `backup/ghex.backup`.
pub struct Sandbox {
    _dir: TempDir,
    pub binary: PathBuf,
    pub backup: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("bin").join("ghex");
        let backup = dir.path().join("backup").join("ghex.backup");
        install_fake_binary(&binary, ORIGINAL_BINARY);
        Self {
            _dir: dir,
            binary,
            backup,
        }
    }

    pub fn manager(&self) -> BinaryManager {
        BinaryManager::with_paths(self.binary.clone(), self.backup.clone())
    }

    pub fn installed(&self) -> Vec<u8> {
        std::fs::read(&self.binary).unwrap()
    }
}

/// Updater pinned to linux/amd64 that talks to `server` and installs into `sandbox`.
pub fn updater(server: &MockServer, manager: BinaryManager, version: &str) -> Updater {
    let client = ReleaseClient::new(server.uri(), Duration::from_secs(5)).unwrap();
    Updater::new(version, client, manager)
        .with_platform("linux", "amd64")
        .with_download_retries(0)
}

/// Release JSON in the GitHub API shape. Asset URLs point at `/download/<name>`.
pub fn release_json(server: &MockServer, tag: &str, assets: &[(&str, usize)]) -> Value {
    let assets: Vec<Value> = assets
        .iter()
        .map(|(name, size)| {
            json!({
                "name": name,
                "browser_download_url": format!("{}/download/{}", server.uri(), name),
                "size": size,
                "content_type": "application/octet-stream",
            })
        })
        .collect();

    json!({
        "tag_name": tag,
        "name": format!("ghex {tag}"),
        "body": format!("Changes in {tag}"),
        "published_at": "2025-01-15T10:00:00Z",
        "html_url": format!("https://github.com/{OWNER}/{REPO}/releases/tag/{tag}"),
        "assets": assets,
    })
}

pub async fn mount_latest(server: &MockServer, release: &Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{OWNER}/{REPO}/releases/latest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

pub async fn mount_release_list(server: &MockServer, releases: &[Value]) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{OWNER}/{REPO}/releases")))
        .and(query_param("per_page", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases))
        .mount(server)
        .await;
}

pub async fn mount_download(server: &MockServer, name: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// `.tar.gz` containing `ghex` with `content`.
pub fn linux_archive(content: &[u8]) -> Vec<u8> {
    ReleaseArchive::new().file("ghex-linux-amd64/ghex", content).tar_gz()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Mount a complete v`tag` release carrying a linux archive of `content`
/// and a matching `checksums.txt`.
pub async fn mount_full_release(server: &MockServer, tag: &str, content: &[u8]) -> Value {
    let archive = linux_archive(content);
    let manifest = format!(
        "# release checksums\n{}  {}\n{}  ghex-darwin-arm64.tar.gz\n",
        sha256_hex(&archive),
        LINUX_ASSET,
        "0".repeat(64)
    );

    let release = release_json(
        server,
        tag,
        &[(LINUX_ASSET, archive.len()), ("checksums.txt", manifest.len())],
    );
    mount_latest(server, &release).await;
    mount_download(server, LINUX_ASSET, archive).await;
    mount_download(server, "checksums.txt", manifest.into_bytes()).await;
    release
}

/// Opt-in tracing output via `RUST_LOG`.
pub fn init_logging() {
    ghex_cli::test_utils::init_test_logging(None);
}
