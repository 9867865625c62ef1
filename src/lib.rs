//! Modpack manifest builder.
//!
//! This crate turns a directory tree into a versioned, content-addressed
//! manifest. It is used by the `modpack` CLI in the `modpack-publisher`
//! crate and can be driven programmatically for tests or other front ends.
//!
//! # Modules
//!
//! - [`builder`] - Build orchestration: scan, hash, version and persist
//! - [`config`] - Built-in defaults merged with the `modpack.toml` settings
//! - [`digest`] - Streaming SHA-1 fingerprints
//! - [`error`] - Build error types
//! - [`ignore`] - Typed ignore rules
//! - [`manifest`] - Manifest document types and JSON rendering
//! - [`notifier`] - Completion notification
//! - [`scanner`] - Deterministic tree traversal
//! - [`version`] - Semantic versions and the version file

mod atomic;
pub mod builder;
pub mod config;
pub mod digest;
pub mod error;
pub mod ignore;
pub mod manifest;
pub mod notifier;
pub mod scanner;
pub mod version;

pub use builder::{BuildOutput, BuildParams, build_manifest};
pub use config::{Config, ConfigError, load_config};
pub use error::BuildError;
pub use manifest::{FileEntry, Manifest};
pub use version::{Version, VersionStore};
