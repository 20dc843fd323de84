//! Test utilities for ghex
//!
//! Helpers shared by unit tests and the integration suite (enabled there via
//! the `test-utils` feature):
//! - [`init_test_logging`] for opt-in tracing output
//! - [`fixtures`] for building release archives and installed binaries on disk

pub mod fixtures;

pub use fixtures::{ReleaseArchive, install_fake_binary};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialise tracing for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`. With neither, logging stays
/// off so test output is not cluttered.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
