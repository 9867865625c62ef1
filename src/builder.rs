//! Manifest builder: scan, hash, version and persist in one pass.
//!
//! A build runs these steps in order and stops at the first failure:
//!
//! 1. make sure the root exists;
//! 2. scan the tree and hash every file;
//! 3. read the stored version and compute the next one;
//! 4. write the manifest, then the version file.
//!
//! Nothing is written until every file has been hashed. If the version file
//! cannot be written after the manifest was replaced, the previous manifest
//! is put back, so a failed build never changes persisted state.

use crate::atomic::write_atomic;
use crate::config::Config;
use crate::digest::compute_sha1;
use crate::error::{BuildError, Result};
use crate::ignore::IgnoreSet;
use crate::manifest::{FileEntry, Manifest, ManifestMetadata};
use crate::scanner::{ScannedFile, scan};
use crate::version::{Version, VersionSource, VersionStore};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, error, info};

/// Inputs of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    /// Directory tree to scan.
    pub root: Utf8PathBuf,
    /// Ignore rules. The manifest and version files are skipped whether or
    /// not a rule names them.
    pub rules: IgnoreSet,
    /// Descriptive manifest fields.
    pub metadata: ManifestMetadata,
    /// Destination of the manifest.
    pub manifest_path: Utf8PathBuf,
    /// Location of the version file.
    pub version_path: Utf8PathBuf,
}

impl BuildParams {
    /// Derive build inputs from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.modpack.root.clone(),
            rules: config.ignore_set(),
            metadata: config.metadata(),
            manifest_path: config.manifest_path(),
            version_path: config.version_path(),
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// The manifest that was written.
    pub manifest: Manifest,
    /// The version the build started from.
    pub previous_version: Version,
    /// Whether the starting version was stored or a fallback.
    pub version_source: VersionSource,
    /// Where the manifest was written.
    pub manifest_path: Utf8PathBuf,
    /// Where the version was written.
    pub version_path: Utf8PathBuf,
}

impl BuildOutput {
    /// The version assigned to this build.
    #[must_use]
    pub fn version(&self) -> Version {
        self.manifest.version
    }
}

/// Build and persist a new manifest.
///
/// # Errors
///
/// Returns a [`BuildError`] describing the first step that failed. When an
/// error is returned neither the manifest nor the version file has changed.
pub fn build_manifest(params: &BuildParams) -> Result<BuildOutput> {
    ensure_root(&params.root)?;

    let mut scanned = scan(&params.root, &params.rules)?;
    scanned.retain(|file| !is_build_output(params, &file.absolute));
    debug!("found {} files under {}", scanned.len(), params.root);
    let files = hash_files(&scanned)?;

    let store = VersionStore::new(params.version_path.clone());
    let previous = store.read();
    let version = previous.version.next();
    debug!("version {} -> {version}", previous.version);

    let manifest = Manifest::new(params.metadata.clone(), version, files);
    let json = manifest.to_json_bytes()?;

    let backup = snapshot(&params.manifest_path)?;
    write_atomic(&params.manifest_path, &json).map_err(|source| BuildError::WriteManifest {
        path: params.manifest_path.clone(),
        source,
    })?;

    if let Err(source) = store.write(&version) {
        restore_manifest(&params.manifest_path, backup.as_deref());
        return Err(BuildError::WriteVersion {
            path: params.version_path.clone(),
            source,
        });
    }

    info!(
        "built {} {version} with {} files",
        manifest.modpack_name,
        manifest.files.len()
    );
    Ok(BuildOutput {
        manifest,
        previous_version: previous.version,
        version_source: previous.source,
        manifest_path: params.manifest_path.clone(),
        version_path: params.version_path.clone(),
    })
}

fn ensure_root(root: &Utf8Path) -> Result<()> {
    if root.is_dir() {
        return Ok(());
    }
    info!("creating missing modpack root {root}");
    std::fs::create_dir_all(root).map_err(|source| BuildError::RootUnavailable {
        path: root.to_path_buf(),
        source,
    })
}

fn is_build_output(params: &BuildParams, path: &Utf8Path) -> bool {
    path == params.manifest_path.as_path() || path == params.version_path.as_path()
}

fn hash_files(scanned: &[ScannedFile]) -> Result<Vec<FileEntry>> {
    scanned
        .iter()
        .map(|file| {
            let sha1 = compute_sha1(file.absolute.as_std_path()).map_err(|source| {
                BuildError::Hash {
                    path: file.absolute.clone(),
                    source,
                }
            })?;
            Ok(FileEntry {
                path: file.relative.clone(),
                sha1,
            })
        })
        .collect()
}

/// Capture the current manifest bytes so a failed build can restore them.
fn snapshot(path: &Utf8Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(BuildError::WriteManifest {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn restore_manifest(path: &Utf8Path, previous: Option<&[u8]>) {
    let outcome = match previous {
        Some(bytes) => write_atomic(path, bytes),
        None => std::fs::remove_file(path),
    };
    if let Err(err) = outcome {
        error!("failed to roll back manifest {path}: {err}");
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
