//! End-to-end update runs against a fake release API.

use crate::common::{
    self, LINUX_ASSET, ORIGINAL_BINARY, Sandbox, linux_archive, mount_download,
    mount_full_release, mount_latest, release_json, sha256_hex,
};
use ghex_cli::core::GhexError;
use ghex_cli::upgrade::{BinaryManager, ReplaceOutcome, ReplaceStrategy};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes garbage over the target and then reports failure.
#[derive(Debug)]
struct CorruptingReplace;

impl ReplaceStrategy for CorruptingReplace {
    fn replace(&self, target: &Path, _new_binary: &Path) -> Result<ReplaceOutcome, GhexError> {
        std::fs::write(target, b"half written")?;
        Err(GhexError::ReplaceFailed {
            path: target.to_path_buf(),
            reason: "simulated failure".to_string(),
        })
    }
}

/// Fails the replace and deletes the backup so the restore fails too.
#[derive(Debug)]
struct BackupEatingReplace {
    backup: PathBuf,
}

impl ReplaceStrategy for BackupEatingReplace {
    fn replace(&self, target: &Path, _new_binary: &Path) -> Result<ReplaceOutcome, GhexError> {
        std::fs::remove_file(&self.backup)?;
        Err(GhexError::ReplaceFailed {
            path: target.to_path_buf(),
            reason: "simulated failure".to_string(),
        })
    }
}

#[tokio::test]
async fn test_successful_update_replaces_binary() {
    common::init_logging();
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_full_release(&server, "v1.1.0", b"ghex 1.1.0").await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, has_update) = updater.check_for_update().await.unwrap();
    assert!(has_update);

    let outcome = updater.update(&release, None).await.unwrap();
    assert_eq!(outcome, ReplaceOutcome::Replaced);
    assert_eq!(sandbox.installed(), b"ghex 1.1.0");
    assert!(updater.has_backup());
    assert_eq!(std::fs::read(&sandbox.backup).unwrap(), ORIGINAL_BINARY);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&sandbox.binary).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0, "installed binary must stay executable");
    }
}

#[tokio::test]
async fn test_rollback_after_update_restores_original() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_full_release(&server, "v1.1.0", b"ghex 1.1.0").await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    updater.update(&release, None).await.unwrap();

    updater.rollback().await.unwrap();
    assert_eq!(sandbox.installed(), ORIGINAL_BINARY);
}

#[tokio::test]
async fn test_checksum_mismatch_leaves_installation_untouched() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let archive = linux_archive(b"tampered build");
    let manifest = format!("{}  {}\n", sha256_hex(b"something else"), LINUX_ASSET);
    let release = release_json(
        &server,
        "v1.1.0",
        &[(LINUX_ASSET, archive.len()), ("checksums.txt", manifest.len())],
    );
    mount_latest(&server, &release).await;
    mount_download(&server, LINUX_ASSET, archive).await;
    mount_download(&server, "checksums.txt", manifest.into_bytes()).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    let err = updater.update(&release, None).await.unwrap_err();

    assert!(matches!(err, GhexError::ChecksumMismatch { .. }), "got {err:?}");
    assert!(!updater.has_backup());
    assert_eq!(sandbox.installed(), ORIGINAL_BINARY);
}

#[tokio::test]
async fn test_checksum_disabled_skips_manifest() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let archive = linux_archive(b"ghex 1.1.0");
    let manifest = format!("{}  {}\n", "f".repeat(64), LINUX_ASSET);
    let release = release_json(
        &server,
        "v1.1.0",
        &[(LINUX_ASSET, archive.len()), ("checksums.txt", manifest.len())],
    );
    mount_latest(&server, &release).await;
    mount_download(&server, LINUX_ASSET, archive).await;
    Mock::given(method("GET"))
        .and(path("/download/checksums.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(manifest))
        .expect(0)
        .mount(&server)
        .await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0")
        .with_checksum_verification(false);
    let (release, _) = updater.check_for_update().await.unwrap();
    updater.update(&release, None).await.unwrap();

    assert_eq!(sandbox.installed(), b"ghex 1.1.0");
}

#[tokio::test]
async fn test_release_without_manifest_installs() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let archive = linux_archive(b"ghex 1.1.0");
    let release = release_json(&server, "v1.1.0", &[(LINUX_ASSET, archive.len())]);
    mount_latest(&server, &release).await;
    mount_download(&server, LINUX_ASSET, archive).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    updater.update(&release, None).await.unwrap();

    assert_eq!(sandbox.installed(), b"ghex 1.1.0");
}

#[tokio::test]
async fn test_download_error_leaves_installation_untouched() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let release = release_json(&server, "v1.1.0", &[(LINUX_ASSET, 1024)]);
    mount_latest(&server, &release).await;
    Mock::given(method("GET"))
        .and(path(format!("/download/{LINUX_ASSET}")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    let err = updater.update(&release, None).await.unwrap_err();

    assert!(matches!(err, GhexError::DownloadFailed { .. }), "got {err:?}");
    assert!(!updater.has_backup());
    assert_eq!(sandbox.installed(), ORIGINAL_BINARY);
}

#[tokio::test]
async fn test_download_is_retried() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let archive = linux_archive(b"ghex 1.1.0");
    let release = release_json(&server, "v1.1.0", &[(LINUX_ASSET, archive.len())]);
    mount_latest(&server, &release).await;
    // First attempt fails, the retry is served by the next mock
    Mock::given(method("GET"))
        .and(path(format!("/download/{LINUX_ASSET}")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_download(&server, LINUX_ASSET, archive).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0").with_download_retries(2);
    let (release, _) = updater.check_for_update().await.unwrap();
    updater.update(&release, None).await.unwrap();

    assert_eq!(sandbox.installed(), b"ghex 1.1.0");
}

#[tokio::test]
async fn test_missing_platform_asset() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let release = release_json(&server, "v1.1.0", &[("ghex-darwin-arm64.tar.gz", 10)]);
    mount_latest(&server, &release).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    let err = updater.update(&release, None).await.unwrap_err();

    match err {
        GhexError::AssetNotFound {
            os,
            arch,
        } => {
            assert_eq!(os, "linux");
            assert_eq!(arch, "amd64");
        }
        other => panic!("expected AssetNotFound, got {other:?}"),
    }
    assert_eq!(sandbox.installed(), ORIGINAL_BINARY);
}

#[tokio::test]
async fn test_archive_without_binary_fails_extraction() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let archive = ghex_cli::test_utils::ReleaseArchive::new().file("README.md", b"docs").tar_gz();
    let release = release_json(&server, "v1.1.0", &[(LINUX_ASSET, archive.len())]);
    mount_latest(&server, &release).await;
    mount_download(&server, LINUX_ASSET, archive).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    let err = updater.update(&release, None).await.unwrap_err();

    assert!(matches!(err, GhexError::ExtractFailed { .. }), "got {err:?}");
    assert!(!updater.has_backup());
    assert_eq!(sandbox.installed(), ORIGINAL_BINARY);
}

#[tokio::test]
async fn test_linux_update_skips_windows_executable_in_tarball() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let archive = ghex_cli::test_utils::ReleaseArchive::new()
        .file("dist/ghex.exe", b"MZ windows build")
        .file("dist/ghex", b"ghex 1.1.0")
        .tar_gz();
    let release = release_json(&server, "v1.1.0", &[(LINUX_ASSET, archive.len())]);
    mount_latest(&server, &release).await;
    mount_download(&server, LINUX_ASSET, archive).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    updater.update(&release, None).await.unwrap();

    assert_eq!(sandbox.installed(), b"ghex 1.1.0");
}

#[tokio::test]
async fn test_backup_failure_aborts_before_replace() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    // A directory where the backup file should go makes the copy fail
    std::fs::create_dir_all(&sandbox.backup).unwrap();
    mount_full_release(&server, "v1.1.0", b"ghex 1.1.0").await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    let err = updater.update(&release, None).await.unwrap_err();

    assert!(matches!(err, GhexError::BackupFailed { .. }), "got {err:?}");
    assert_eq!(sandbox.installed(), ORIGINAL_BINARY);
}

#[tokio::test]
async fn test_replace_failure_restores_backup() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_full_release(&server, "v1.1.0", b"ghex 1.1.0").await;

    let manager = sandbox.manager().with_strategy(Arc::new(CorruptingReplace));
    let updater = common::updater(&server, manager, "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    let err = updater.update(&release, None).await.unwrap_err();

    assert!(matches!(err, GhexError::ReplaceFailed { .. }), "got {err:?}");
    assert!(err.is_replace_class());
    assert_eq!(sandbox.installed(), ORIGINAL_BINARY);
}

#[tokio::test]
async fn test_replace_and_restore_failure_reports_both() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_full_release(&server, "v1.1.0", b"ghex 1.1.0").await;

    let manager: BinaryManager = sandbox.manager().with_strategy(Arc::new(BackupEatingReplace {
        backup: sandbox.backup.clone(),
    }));
    let updater = common::updater(&server, manager, "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    let err = updater.update(&release, None).await.unwrap_err();

    match err {
        GhexError::ReplaceAndRestoreFailed {
            replace,
            restore,
        } => {
            assert!(matches!(*replace, GhexError::ReplaceFailed { .. }));
            assert!(matches!(*restore, GhexError::NoBackupAvailable { .. }));
        }
        other => panic!("expected ReplaceAndRestoreFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_progress_is_monotonic_and_completes() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();

    let payload: Vec<u8> = (0..512 * 1024).map(|i| (i % 251) as u8).collect();
    let archive = linux_archive(&payload);
    let total = archive.len() as u64;
    let release = release_json(&server, "v1.1.0", &[(LINUX_ASSET, archive.len())]);
    mount_latest(&server, &release).await;
    mount_download(&server, LINUX_ASSET, archive).await;

    let seen = Mutex::new(Vec::new());
    let on_progress = |current: u64, total: u64| seen.lock().unwrap().push((current, total));

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, _) = updater.check_for_update().await.unwrap();
    updater.update(&release, Some(&on_progress)).await.unwrap();

    let seen = seen.into_inner().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    assert!(seen.iter().all(|(_, t)| *t == total));
    assert_eq!(seen.last().map(|(current, _)| *current), Some(total));
    assert_eq!(sandbox.installed(), payload);
}
