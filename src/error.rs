//! Error types for manifest builds.
//!
//! Every variant is fatal: the build aborts and neither the manifest nor the
//! version file is left modified. Recoverable conditions (a malformed version
//! file, a missing settings file) never surface here; they fall back to
//! defaults and log a warning instead.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Errors arising while scanning, hashing, or persisting a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The scan root is missing and could not be created.
    #[error("modpack root {path} is unavailable: {source}")]
    RootUnavailable {
        /// The configured root directory.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be read during traversal.
    #[error("failed to walk {path}: {source}")]
    Walk {
        /// The entry being visited when the walk failed.
        path: PathBuf,
        /// Underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// Following symbolic links led back to an ancestor directory.
    #[error("symbolic link cycle at {path} (points back to {ancestor})")]
    SymlinkLoop {
        /// The link that closes the cycle.
        path: PathBuf,
        /// The ancestor directory it resolves to.
        ancestor: PathBuf,
    },

    /// A file name cannot be represented in the manifest.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    /// A scanned file could not be read for hashing.
    #[error("failed to hash {path}: {source}")]
    Hash {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be rendered as JSON.
    #[error("manifest serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The manifest file could not be written.
    #[error("failed to write manifest {path}: {source}")]
    WriteManifest {
        /// Destination of the manifest.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The version file could not be written.
    #[error("failed to write version file {path}: {source}")]
    WriteVersion {
        /// Destination of the version file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`BuildError`].
pub type Result<T> = std::result::Result<T, BuildError>;
