//! Shared helpers for the ghex CLI.
//!
//! - [`progress`]: indicatif-backed progress bars that honour `GHEX_NO_PROGRESS`

pub mod progress;

pub use progress::{ProgressBar, ProgressStyle};
