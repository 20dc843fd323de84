//! `ghex version`: print the running version and platform.

use crate::upgrade::platform::{current_platform, is_supported_platform, platform_display_name};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Show the ghex version and the platform it was built for.
#[derive(Args, Debug, Default)]
pub struct VersionCommand {}

impl VersionCommand {
    /// Print the version banner.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` for symmetry with the other commands.
    pub fn execute(self) -> Result<()> {
        println!("{}", version_line().bold());

        let (os, arch) = current_platform();
        let platform = platform_display_name(&os, &arch);
        if is_supported_platform(&os, &arch) {
            println!("Platform: {platform}");
        } else {
            println!("Platform: {platform} {}", "(self-update unavailable)".yellow());
        }
        Ok(())
    }
}

fn version_line() -> String {
    format!("ghex v{}", env!("CARGO_PKG_VERSION"))
}
