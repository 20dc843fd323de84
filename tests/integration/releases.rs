//! Update checks, tag lookups and changelog against a fake release API.

use crate::common::{self, OWNER, REPO, Sandbox, mount_latest, mount_release_list, release_json};
use ghex_cli::core::GhexError;
use ghex_cli::upgrade::format_changelog;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_same_version_is_not_an_update() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_latest(&server, &release_json(&server, "v1.0.0", &[])).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let (release, has_update) = updater.check_for_update().await.unwrap();

    assert_eq!(release.tag_name, "v1.0.0");
    assert!(!has_update);
}

#[tokio::test]
async fn test_older_remote_is_not_an_update() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_latest(&server, &release_json(&server, "v0.9.5", &[])).await;

    let updater = common::updater(&server, sandbox.manager(), "v1.0.0");
    let (_, has_update) = updater.check_for_update().await.unwrap();
    assert!(!has_update);
}

#[tokio::test]
async fn test_release_over_prerelease_is_an_update() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_latest(&server, &release_json(&server, "v1.0.0", &[])).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0-beta");
    let (_, has_update) = updater.check_for_update().await.unwrap();
    assert!(has_update);
}

#[tokio::test]
async fn test_check_does_not_touch_disk() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_latest(&server, &release_json(&server, "v2.0.0", &[])).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    updater.check_for_update().await.unwrap();

    assert!(!sandbox.backup.exists());
    assert!(!sandbox.backup.parent().unwrap().exists());
    assert_eq!(sandbox.installed(), common::ORIGINAL_BINARY);
}

#[tokio::test]
async fn test_missing_repository_is_release_not_found() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    Mock::given(method("GET"))
        .and(path(format!("/repos/{OWNER}/{REPO}/releases/latest")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let err = updater.check_for_update().await.unwrap_err();
    assert!(matches!(err, GhexError::ReleaseNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_server_error_is_network_error() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    Mock::given(method("GET"))
        .and(path(format!("/repos/{OWNER}/{REPO}/releases/latest")))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let err = updater.check_for_update().await.unwrap_err();
    assert!(matches!(err, GhexError::NetworkError { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_malformed_remote_tag_is_invalid_version() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_latest(&server, &release_json(&server, "nightly", &[])).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let err = updater.check_for_update().await.unwrap_err();
    match err {
        GhexError::InvalidVersion {
            version,
        } => assert_eq!(version, "nightly"),
        other => panic!("expected InvalidVersion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_release_by_tag() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    Mock::given(method("GET"))
        .and(path(format!("/repos/{OWNER}/{REPO}/releases/tags/v1.0.3")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(release_json(&server, "v1.0.3", &[])),
        )
        .mount(&server)
        .await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let release = updater.get_release("v1.0.3").await.unwrap();
    assert_eq!(release.tag_name, "v1.0.3");
    assert_eq!(release.display_name(), "ghex v1.0.3");
    assert!(release.published_at.is_some());
}

#[tokio::test]
async fn test_changelog_keeps_newer_versions_in_order() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_release_list(
        &server,
        &[
            release_json(&server, "v1.2.0", &[]),
            release_json(&server, "nightly-2025-01-10", &[]),
            release_json(&server, "v1.1.0", &[]),
            release_json(&server, "v1.0.0", &[]),
            release_json(&server, "v0.9.0", &[]),
        ],
    )
    .await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let releases = updater.get_changelog("1.0.0").await.unwrap();
    let tags: Vec<&str> = releases.iter().map(|r| r.tag_name.as_str()).collect();
    assert_eq!(tags, ["v1.2.0", "v1.1.0"]);

    let rendered = format_changelog(&releases);
    assert!(rendered.contains("## ghex v1.2.0 (v1.2.0)"));
    assert!(rendered.contains("Changes in v1.1.0"));
    assert!(!rendered.contains("nightly"));
}

#[tokio::test]
async fn test_changelog_when_up_to_date() {
    let server = MockServer::start().await;
    let sandbox = Sandbox::new();
    mount_release_list(&server, &[release_json(&server, "v1.0.0", &[])]).await;

    let updater = common::updater(&server, sandbox.manager(), "1.0.0");
    let releases = updater.get_changelog("v1.0.0").await.unwrap();
    assert!(releases.is_empty());
    assert_eq!(format_changelog(&releases), "No changes found.");
}
