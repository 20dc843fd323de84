//! Progress indicators for long-running operations.
//!
//! Thin wrapper over [`indicatif`] with ghex styling. All indicators are
//! hidden when output is not meant for a human.
//!
//! # Environment Variables
//!
//! - `GHEX_NO_PROGRESS`: set to any value to disable all progress indicators
//!   (the `--no-progress` flag sets it)

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Environment variable that hides every progress indicator.
pub const NO_PROGRESS_ENV: &str = "GHEX_NO_PROGRESS";

/// Whether progress indicators are disabled via [`NO_PROGRESS_ENV`].
#[must_use]
pub fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar or spinner that is a silent no-op when progress is disabled.
///
/// Cloning yields a handle to the same bar, so a clone can be moved into a
/// download callback while the original is finished afterwards.
///
/// ```rust
/// use ghex_cli::utils::progress::ProgressBar;
///
/// let bar = ProgressBar::new_download(1024);
/// bar.set_prefix("ghex-linux-amd64.tar.gz");
/// bar.set_position(512);
/// bar.finish_and_clear();
/// ```
#[derive(Clone, Debug)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Byte-oriented bar for a download of `total` bytes.
    #[must_use]
    pub fn new_download(total: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(total);
            bar.set_style(ProgressStyle::download());
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// Spinner for work of unknown length, such as API requests.
    #[must_use]
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(ProgressStyle::spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// Set the trailing message.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Set the leading label.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Update the total, e.g. once the server reports a length.
    pub fn set_length(&self, len: u64) {
        self.inner.set_length(len);
    }

    /// Set absolute progress.
    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    /// Finish and remove the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// ghex progress styles.
pub struct ProgressStyle;

impl ProgressStyle {
    /// `name [━━━━╸   ] 1.2 MiB/4.0 MiB (3s)`
    #[must_use]
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("download template is valid")
            .progress_chars("━╸━")
    }

    /// Braille spinner with a message.
    #[must_use]
    pub fn spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("spinner template is valid")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
    }
}
