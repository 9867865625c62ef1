//! Modpack release publisher.
//!
//! This crate provides the `modpack` CLI: it drives manifest builds from the
//! `modpack` library and publishes finished builds as GitHub releases. The
//! pieces are exposed as a library so the publish flow can be tested with a
//! mocked release API.
//!
//! # Modules
//!
//! - [`archive`] - Release archive packaging
//! - [`cli`] - Command-line argument definitions
//! - [`error`] - Top-level error type
//! - [`logging`] - Log subscriber initialisation
//! - [`publish`] - The create, upload and publish flow
//! - [`release`] - GitHub Releases client

pub mod archive;
pub mod cli;
pub mod error;
pub mod logging;
pub mod publish;
pub mod release;
