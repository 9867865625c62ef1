//! Top-level error type for the `modpack` CLI.

use crate::archive::ArchiveError;
use crate::release::ReleaseError;
use modpack::config::ConfigError;
use modpack::error::BuildError;
use modpack::manifest::ManifestError;
use modpack::version::{Version, VersionError};
use thiserror::Error;

/// Errors that abort a CLI run.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// The settings document could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Building the manifest failed.
    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    /// No API token is available for publishing.
    #[error("environment variable {variable} is not set; a GitHub token is required to publish")]
    MissingToken {
        /// The variable that was consulted.
        variable: &'static str,
    },

    /// The version file is missing or invalid.
    #[error("cannot publish without a valid version file: {0}")]
    VersionFile(#[from] VersionError),

    /// The manifest could not be loaded.
    #[error("cannot publish without a manifest: {0}")]
    ManifestRead(#[from] ManifestError),

    /// The manifest and version file describe different builds.
    #[error(
        "manifest version {manifest} does not match version file {version_file}; rebuild before releasing"
    )]
    VersionMismatch {
        /// Version recorded in the manifest.
        manifest: Version,
        /// Version recorded in the version file.
        version_file: Version,
    },

    /// Packaging the release archive failed.
    #[error("packaging failed: {0}")]
    Archive(#[from] ArchiveError),

    /// A release API call failed.
    #[error("release failed: {0}")]
    Release(#[from] ReleaseError),
}

/// Result type alias using [`PublisherError`].
pub type Result<T> = std::result::Result<T, PublisherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_names_both_versions() {
        let err = PublisherError::VersionMismatch {
            manifest: Version::new(1, 0, 3),
            version_file: Version::new(1, 0, 4),
        };
        let message = err.to_string();
        assert!(message.contains("1.0.3"));
        assert!(message.contains("1.0.4"));
    }

    #[test]
    fn missing_token_names_the_variable() {
        let err = PublisherError::MissingToken {
            variable: "GITHUB_TOKEN",
        };
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn release_errors_keep_the_status() {
        let err = PublisherError::from(ReleaseError::Status {
            operation: "create release".to_owned(),
            status: 422,
            body: "already_exists".to_owned(),
        });
        let message = err.to_string();
        assert!(message.contains("422"));
        assert!(message.contains("already_exists"));
    }
}
