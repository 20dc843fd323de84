//! Global configuration for ghex.
//!
//! The settings file holds user-wide options for the updater. It is optional:
//! a missing file means every option keeps its default.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.ghex/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\ghex\config.toml`
//!
//! The location can be overridden with `--config <path>` or the
//! `GHEX_CONFIG_PATH` environment variable.
//!
//! # File Format
//!
//! ```toml
//! [upgrade]
//! # Use a mirror of the release API
//! api_url = "https://github.example.com/api/v3"
//! repo_owner = "dwirx"
//! repo_name = "ghex"
//! verify_checksum = true
//! download_retries = 2
//! timeout_secs = 30
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use ghex_cli::config::GlobalConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = GlobalConfig::load().await?;
//! config.upgrade.download_retries = 5;
//! config.save().await?;
//! # Ok(())
//! # }
//! ```

use crate::upgrade::config::UpgradeConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "GHEX_CONFIG_PATH";

/// User-wide ghex settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Self-update settings (`[upgrade]` table).
    #[serde(default, skip_serializing_if = "UpgradeConfig::is_default")]
    pub upgrade: UpgradeConfig,
}

impl GlobalConfig {
    /// Load from the default location, or return defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` when given, else from the default location.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load and parse a specific file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid TOML for this schema.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Save to the default location.
    ///
    /// # Errors
    ///
    /// See [`save_to`](Self::save_to).
    pub async fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path).await
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    ///
    /// On Unix the file is restricted to mode `0600`.
    ///
    /// # Errors
    ///
    /// Fails on serialization or I/O errors.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }

    /// Default configuration file location, honouring `GHEX_CONFIG_PATH`.
    ///
    /// # Errors
    ///
    /// Fails when no home (or local app-data) directory can be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("ghex")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".ghex")
        };

        Ok(config_dir.join("config.toml"))
    }
}
