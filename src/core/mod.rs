//! Core types and error handling for ghex.
//!
//! - [`error`] defines [`GhexError`], the structured error taxonomy shared by
//!   the update pipeline, and [`ErrorContext`] for user-facing reporting.

pub mod error;

pub use error::{ErrorContext, GhexError, user_friendly_error};

/// Result alias used throughout the update core.
pub type Result<T, E = GhexError> = std::result::Result<T, E>;
