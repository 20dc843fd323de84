use crate::constants::{
    DEFAULT_API_URL, DEFAULT_DOWNLOAD_RETRIES, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REPO_NAME,
    DEFAULT_REPO_OWNER,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for `ghex update`, stored in the `[upgrade]` table of the
/// global configuration file.
///
/// Every field has a default, so a partial table (or none at all) is valid:
///
/// ```toml
/// [upgrade]
/// verify_checksum = true
/// download_retries = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Release API base URL; point it at a mirror or GitHub Enterprise.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Owner of the repository that publishes releases.
    #[serde(default = "default_repo_owner")]
    pub repo_owner: String,

    /// Repository that publishes releases.
    #[serde(default = "default_repo_name")]
    pub repo_name: String,

    /// Verify downloads against the release's checksum manifest when one exists.
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum: bool,

    /// Extra download attempts after a failed one.
    #[serde(default = "default_download_retries")]
    pub download_retries: usize,

    /// HTTP timeout for release metadata requests, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            repo_owner: default_repo_owner(),
            repo_name: default_repo_name(),
            verify_checksum: default_verify_checksum(),
            download_retries: default_download_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_repo_owner() -> String {
    DEFAULT_REPO_OWNER.to_string()
}

fn default_repo_name() -> String {
    DEFAULT_REPO_NAME.to_string()
}

fn default_verify_checksum() -> bool {
    true
}

fn default_download_retries() -> usize {
    DEFAULT_DOWNLOAD_RETRIES
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl UpgradeConfig {
    /// Metadata request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether every field still has its default value.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UpgradeConfig::default();
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.repo_owner, "dwirx");
        assert_eq!(config.repo_name, "ghex");
        assert!(config.verify_checksum);
        assert_eq!(config.download_retries, 2);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.is_default());
    }

    #[test]
    fn test_partial_table_fills_defaults() {
        let config: UpgradeConfig = toml::from_str("verify_checksum = false\n").unwrap();
        assert!(!config.verify_checksum);
        assert_eq!(config.repo_name, "ghex");
        assert!(!config.is_default());
    }
}
