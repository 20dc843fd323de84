//! Integration test suite for ghex
//!
//! End-to-end tests of the self-update flow against a local fake of the
//! GitHub release API (`wiremock`), plus smoke tests of the `ghex` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **common**: mock server fixtures and a sandboxed install location
//! - **releases**: update checks, tag lookup and changelog filtering
//! - **update_flow**: download, verify, backup, replace and rollback paths
//! - **cli**: `ghex` binary behaviour

mod cli;
mod common;
mod releases;
mod update_flow;
