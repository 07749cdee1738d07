//! Shared test fixtures for the repo-policy workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`git`] - real git repositories with history, and helpers to inspect them
//! - [`docs`] - [`TestDocs`](docs::TestDocs) for writing policy and target documents

pub mod docs;
pub mod git;
