//! The manifest document describing one build of the modpack.
//!
//! A manifest is created fresh on every build and never merged with a
//! previous one. Its JSON form uses four-space indentation and the field
//! order of [`Manifest`], which keeps diffs between releases readable.

use crate::digest::Sha1Digest;
use crate::version::Version;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Indentation used when rendering manifests.
const INDENT: &[u8] = b"    ";

/// Errors raised while loading a manifest from disk.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Read {
        /// Location of the manifest.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest file is not a valid manifest document.
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        /// Location of the manifest.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// One file listed in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the modpack root, `/`-separated.
    pub path: String,
    /// SHA-1 of the file content.
    pub sha1: Sha1Digest,
}

/// Descriptive fields copied into every manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestMetadata {
    /// Display name of the modpack.
    pub modpack_name: String,
    /// Minecraft version the pack targets.
    pub mc_version: String,
    /// Mod loader, such as `fabric`.
    pub loader: String,
    /// Loader version, when pinned.
    pub loader_version: Option<String>,
    /// Required Java version, when pinned.
    pub java_version: Option<String>,
}

/// A complete build manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Display name of the modpack.
    pub modpack_name: String,
    /// Version assigned to this build.
    pub version: Version,
    /// Minecraft version the pack targets.
    pub mc_version: String,
    /// Mod loader.
    pub loader: String,
    /// Loader version, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader_version: Option<String>,
    /// Java version, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<String>,
    /// Files in traversal order.
    pub files: Vec<FileEntry>,
}

impl Manifest {
    /// Assemble a manifest from its parts.
    #[must_use]
    pub fn new(metadata: ManifestMetadata, version: Version, files: Vec<FileEntry>) -> Self {
        let ManifestMetadata {
            modpack_name,
            mc_version,
            loader,
            loader_version,
            java_version,
        } = metadata;
        Self {
            modpack_name,
            version,
            mc_version,
            loader,
            loader_version,
            java_version,
            files,
        }
    }

    /// Render the manifest as four-space indented JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; with the types used here this only
    /// happens if the writer fails, which a `Vec` never does.
    ///
    /// # Examples
    ///
    /// ```
    /// use modpack::manifest::{Manifest, ManifestMetadata};
    /// use modpack::version::Version;
    ///
    /// let metadata = ManifestMetadata {
    ///     modpack_name: "Terereland".to_owned(),
    ///     mc_version: "1.20.1".to_owned(),
    ///     loader: "fabric".to_owned(),
    ///     loader_version: None,
    ///     java_version: None,
    /// };
    /// let manifest = Manifest::new(metadata, Version::new(1, 0, 1), Vec::new());
    /// let json = String::from_utf8(manifest.to_json_bytes()?).expect("UTF-8");
    /// assert!(json.starts_with("{\n    \"modpack_name\": \"Terereland\""));
    /// # Ok::<(), serde_json::Error>(())
    /// ```
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        Ok(buffer)
    }

    /// Load a manifest previously written by a build.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] or [`ManifestError::Parse`].
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
