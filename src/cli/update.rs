//! `ghex update`: check for, install and roll back ghex releases.

use crate::config::GlobalConfig;
use crate::core::GhexError;
use crate::upgrade::{ReleaseInfo, ReplaceOutcome, Updater, format_changelog};
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Update ghex to the latest release.
///
/// Without flags this checks the latest GitHub release, asks for
/// confirmation and installs it, keeping a backup of the current binary.
///
/// # Examples
///
/// ```bash
/// ghex update --check       # only report whether an update exists
/// ghex update --changelog   # show what changed before updating
/// ghex update -y            # update without prompting
/// ghex update --rollback    # restore the binary saved by the last update
/// ```
#[derive(Args, Debug, Default)]
pub struct UpdateCommand {
    /// Check for updates without installing
    #[arg(short, long)]
    pub check: bool,

    /// Show changelog before updating
    #[arg(long)]
    pub changelog: bool,

    /// Rollback to previous version
    #[arg(long, conflicts_with_all = ["check", "changelog"])]
    pub rollback: bool,

    /// Force update without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Auto-confirm prompts
    #[arg(short, long)]
    pub yes: bool,
}

impl UpdateCommand {
    /// Build an updater for the running binary from `config` and run.
    ///
    /// # Errors
    ///
    /// Fails when the updater cannot be set up, or with any error from the
    /// selected operation.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let updater = Updater::from_config(env!("CARGO_PKG_VERSION"), &config.upgrade)
            .context("Failed to initialize updater")?;
        self.execute_with_updater(&updater).await
    }

    /// Run against an already configured updater.
    ///
    /// # Errors
    ///
    /// Any error from checking, updating or rolling back.
    pub async fn execute_with_updater(self, updater: &Updater) -> Result<()> {
        if self.rollback {
            return self.run_rollback(updater).await;
        }
        self.run_update(updater).await
    }

    fn skip_confirmation(&self) -> bool {
        self.force || self.yes
    }

    async fn run_update(&self, updater: &Updater) -> Result<()> {
        println!("{}", "Checking for updates...".cyan());

        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Fetching latest release");
        let checked = updater.check_for_update().await;
        spinner.finish_and_clear();
        let (release, has_update) = checked.context("Failed to check for updates")?;

        let current = updater.current_version().trim_start_matches('v');
        if !has_update {
            println!(
                "{}",
                format!("You're already running the latest version (v{current})").green()
            );
            return Ok(());
        }

        println!();
        println!("Current version: {}", format!("v{current}").yellow());
        println!("Latest version:  {}", release.tag_name.green().bold());
        println!();

        if self.changelog {
            show_changelog(updater).await;
        }

        if self.check {
            println!("Run {} to install the latest version", "ghex update".cyan());
            return Ok(());
        }

        if !self.skip_confirmation() && !confirm("Do you want to update? [y/N]:").await? {
            println!("{}", "Update cancelled".yellow());
            return Ok(());
        }

        self.install(updater, &release).await
    }

    async fn install(&self, updater: &Updater, release: &ReleaseInfo) -> Result<()> {
        println!("{}", "Downloading update...".cyan());

        let bar = ProgressBar::new_download(0);
        bar.set_prefix(release.tag_name.clone());
        let handle = bar.clone();
        let on_progress = move |current: u64, total: u64| {
            if total > 0 {
                handle.set_length(total);
            }
            handle.set_position(current);
        };

        let result = updater.update(release, Some(&on_progress)).await;
        bar.finish_and_clear();

        match result {
            Ok(ReplaceOutcome::Replaced) => {
                println!("{}", format!("Successfully updated to {}!", release.tag_name).green());
                println!("Please restart ghex to use the new version");
                Ok(())
            }
            Ok(ReplaceOutcome::Deferred) => {
                println!(
                    "{}",
                    format!("Update to {} is staged and finishes when ghex exits.", release.tag_name)
                        .green()
                );
                println!("Please restart ghex to use the new version");
                Ok(())
            }
            Err(e) => {
                if offer_rollback(&e, updater) {
                    eprintln!(
                        "You can rollback to the previous version with: {}",
                        "ghex update --rollback".cyan()
                    );
                }
                Err(e).context(format!("Update to {} failed", release.tag_name))
            }
        }
    }

    async fn run_rollback(&self, updater: &Updater) -> Result<()> {
        if !updater.has_backup() {
            return Err(GhexError::NoBackupAvailable {
                path: updater.binary_manager().backup_path().to_path_buf(),
            }
            .into());
        }

        match updater.binary_manager().backup_info().await {
            Ok(info) => println!(
                "Backup: {} ({} bytes, saved {})",
                info.path.display(),
                info.size,
                info.modified.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Err(e) => debug!("Could not read backup metadata: {}", e),
        }

        if !self.skip_confirmation()
            && !confirm("Do you want to rollback to the previous version? [y/N]:").await?
        {
            println!("{}", "Rollback cancelled".yellow());
            return Ok(());
        }

        println!("{}", "Rolling back to previous version...".yellow());
        updater.rollback().await.context("Rollback failed")?;

        println!("{}", "Successfully rolled back to previous version!".green());
        println!("Please restart ghex to use the restored version");
        Ok(())
    }
}

/// Rollback only helps once the installed binary may have been touched.
fn offer_rollback(error: &GhexError, updater: &Updater) -> bool {
    error.is_replace_class() && updater.has_backup()
}

async fn show_changelog(updater: &Updater) {
    let releases = match updater.get_changelog(updater.current_version()).await {
        Ok(releases) => releases,
        Err(e) => {
            eprintln!("{}", format!("Failed to fetch changelog: {e}").red());
            return;
        }
    };

    if releases.is_empty() {
        println!("No changelog available");
        return;
    }

    let rule = "-".repeat(50);
    println!("{}", "Changelog:".bold());
    println!("{rule}");
    println!("{}", format_changelog(&releases));
    println!("{rule}");
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no, including EOF.
async fn confirm(question: &str) -> Result<bool> {
    print!("{} ", question.green());
    io::stdout().flush()?;

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut response = String::new();
    reader.read_line(&mut response).await?;
    Ok(is_affirmative(&response))
}

fn is_affirmative(response: &str) -> bool {
    matches!(response.trim().to_lowercase().as_str(), "y" | "yes")
}
