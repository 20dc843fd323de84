//! Mapping from the running platform to a release asset.
//!
//! Release assets use Go-style platform names (`linux`, `darwin`, `windows`;
//! `amd64`, `arm64`), so the Rust target constants are translated first.

use crate::core::GhexError;
use crate::upgrade::release::{Asset, ReleaseInfo};
use tracing::debug;

/// Platforms ghex publishes binaries for, as `(os, arch)` pairs.
pub const SUPPORTED_PLATFORMS: &[(&str, &str)] = &[
    ("linux", "amd64"),
    ("linux", "arm64"),
    ("darwin", "amd64"),
    ("darwin", "arm64"),
    ("windows", "amd64"),
    ("windows", "arm64"),
];

/// The `(os, arch)` pair of the running binary in release-asset naming.
#[must_use]
pub fn current_platform() -> (String, String) {
    (normalize_os(std::env::consts::OS), normalize_arch(std::env::consts::ARCH))
}

/// Translate a Rust OS name into the release naming (`macos` becomes `darwin`).
#[must_use]
pub fn normalize_os(os: &str) -> String {
    match os {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

/// Translate a Rust architecture name into the release naming.
#[must_use]
pub fn normalize_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

/// Membership test against [`SUPPORTED_PLATFORMS`]. Used for diagnostics only.
#[must_use]
pub fn is_supported_platform(os: &str, arch: &str) -> bool {
    SUPPORTED_PLATFORMS.iter().any(|(o, a)| *o == os && *a == arch)
}

/// Archive extension used for `os`: `.zip` on Windows, `.tar.gz` elsewhere.
#[must_use]
pub fn archive_extension(os: &str) -> &'static str {
    if os == "windows" { ".zip" } else { ".tar.gz" }
}

/// Expected asset file name, e.g. `ghex-linux-arm64.tar.gz`.
#[must_use]
pub fn asset_name(binary: &str, os: &str, arch: &str) -> String {
    format!("{binary}-{os}-{arch}{}", archive_extension(os))
}

/// Pick the asset for `(os, arch)` from a release.
///
/// The exact [`asset_name`] wins. Otherwise the first asset whose name starts
/// with `<binary>_<os>_<arch>` or `<binary>-<os>-<arch>` is taken.
///
/// # Errors
///
/// Returns [`GhexError::AssetNotFound`] when nothing matches.
pub fn select_asset<'a>(
    release: &'a ReleaseInfo,
    binary: &str,
    os: &str,
    arch: &str,
) -> Result<&'a Asset, GhexError> {
    let expected = asset_name(binary, os, arch);
    if let Some(asset) = release.assets.iter().find(|a| a.name == expected) {
        debug!("Selected asset {}", asset.name);
        return Ok(asset);
    }

    let prefixes = [format!("{binary}_{os}_{arch}"), format!("{binary}-{os}-{arch}")];
    for prefix in &prefixes {
        if let Some(asset) = release.assets.iter().find(|a| a.name.starts_with(prefix.as_str())) {
            debug!("Selected asset {} by prefix {}", asset.name, prefix);
            return Ok(asset);
        }
    }

    Err(GhexError::AssetNotFound {
        os: os.to_string(),
        arch: arch.to_string(),
    })
}

/// Human readable platform label such as `macOS ARM64` or `Linux x64`.
#[must_use]
pub fn platform_display_name(os: &str, arch: &str) -> String {
    let os = match os {
        "darwin" => "macOS",
        "linux" => "Linux",
        "windows" => "Windows",
        other => other,
    };
    let arch = match arch {
        "amd64" => "x64",
        "arm64" => "ARM64",
        other => other,
    };
    format!("{os} {arch}")
}
