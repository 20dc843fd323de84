//! Configuration for ghex.
//!
//! - [`GlobalConfig`]: the optional user-wide settings file (`~/.ghex/config.toml`)
//! - [`UpgradeConfig`]: its `[upgrade]` table, consumed by the updater

mod global;

pub use crate::upgrade::config::UpgradeConfig;
pub use global::{CONFIG_PATH_ENV, GlobalConfig};
