//! Command-line interface for ghex.
//!
//! # Available Commands
//!
//! - `update` - Check for, install or roll back ghex releases
//! - `version` - Print the running version and platform
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--no-progress` - Disable progress bars and spinners
//! - `--config` - Path to a custom settings file
//!
//! # Example
//!
//! ```bash
//! # See whether a new release exists
//! ghex update --check
//!
//! # Install it without prompting, with debug logs
//! ghex update --yes --verbose
//! ```

mod update;
mod version;

pub use update::UpdateCommand;
pub use version::VersionCommand;

use crate::config::GlobalConfig;
use crate::utils::progress::NO_PROGRESS_ENV;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log filter used when neither `RUST_LOG` nor a verbosity flag is given.
const DEFAULT_LOG_FILTER: &str = "warn,ghex_cli=info";

/// Settings derived from the global flags, applied before a command runs.
///
/// Kept separate from [`Cli`] so tests can build it directly.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive (`debug`, `error`, ...). `None` uses the default.
    pub log_level: Option<String>,

    /// Hide progress bars and spinners.
    pub no_progress: bool,

    /// Settings file to load instead of the default location.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Export settings that other modules read from the environment.
    ///
    /// Sets `GHEX_NO_PROGRESS=1` when progress is disabled.
    pub fn apply_to_env(&self) {
        if self.no_progress {
            // SAFETY: runs once on the main task before any command spawns
            // work that reads the environment.
            unsafe { std::env::set_var(NO_PROGRESS_ENV, "1") };
        }
    }

    /// Log filter for this configuration. An explicit `RUST_LOG` always wins.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        if std::env::var_os("RUST_LOG").is_some() {
            return EnvFilter::from_default_env();
        }
        let directive = self.log_level.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }

    /// Install the global tracing subscriber. Later calls are no-ops.
    pub fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// ghex command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "ghex",
    about = "ghex - Git identity switcher and downloader",
    version,
    author,
    long_about = "ghex manages Git identities and downloads. This build provides the self-update commands."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a custom settings file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable progress bars and spinners
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update ghex to the latest version
    Update(UpdateCommand),

    /// Show version information
    Version(VersionCommand),
}

impl Cli {
    /// Run the parsed command.
    ///
    /// # Errors
    ///
    /// Propagates the command's error for `main` to render.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Run with an explicit [`CliConfig`].
    ///
    /// # Errors
    ///
    /// Fails if the settings file cannot be loaded or the command fails.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply_to_env();
        config.init_logging();

        match self.command {
            Commands::Update(cmd) => {
                let settings = GlobalConfig::load_with_optional(config.config_path).await?;
                cmd.execute(&settings).await
            }
            Commands::Version(cmd) => cmd.execute(),
        }
    }
}
