//! Release archive packaging.
//!
//! The archive holds exactly the files a manifest lists, stored under their
//! manifest paths. Every file is re-hashed before anything is written, so an
//! archive is never built from a tree that changed since the manifest was
//! generated.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use modpack::digest::{Sha1Digest, compute_sha1};
use modpack::manifest::Manifest;
use modpack::version::Version;
use std::fs;
use std::io::{self, Write};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Errors arising while packaging a release archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The archive directory could not be created.
    #[error("failed to create archive directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A listed file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        /// The file on disk.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A listed file no longer matches its manifest digest.
    #[error("{path} changed since the manifest was built (expected {expected}, found {actual})")]
    StaleManifest {
        /// Manifest path of the changed file.
        path: String,
        /// Digest recorded in the manifest.
        expected: Sha1Digest,
        /// Digest of the file now.
        actual: Sha1Digest,
    },

    /// Writing the archive failed.
    #[error("failed to write archive {path}: {source}")]
    WriteArchive {
        /// Destination of the archive.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The zip encoder reported an error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Inputs of [`package_release`].
#[derive(Debug, Clone, Copy)]
pub struct ArchiveParams<'a> {
    /// The manifest whose files are packaged.
    pub manifest: &'a Manifest,
    /// Root the manifest paths are relative to.
    pub root: &'a Utf8Path,
    /// Directory receiving the archive.
    pub archive_dir: &'a Utf8Path,
}

/// File name of the archive for `version`.
///
/// # Examples
///
/// ```
/// use modpack::version::Version;
/// use modpack_publisher::archive::archive_name;
///
/// assert_eq!(archive_name(Version::new(1, 0, 4)), "modpack_v1.0.4.zip");
/// ```
#[must_use]
pub fn archive_name(version: Version) -> String {
    format!("modpack_v{version}.zip")
}

/// Package every file listed in the manifest into a deflate zip.
///
/// Returns the path of the archive, which replaces any earlier archive of
/// the same version.
///
/// # Errors
///
/// Returns [`ArchiveError::StaleManifest`] when a file's content no longer
/// matches the manifest, and the other variants on I/O or zip failures. No
/// archive is left behind on error.
pub fn package_release(params: ArchiveParams<'_>) -> Result<Utf8PathBuf, ArchiveError> {
    let sources = verify_sources(params.manifest, params.root)?;

    fs::create_dir_all(params.archive_dir).map_err(|source| ArchiveError::CreateDirectory {
        path: params.archive_dir.to_path_buf(),
        source,
    })?;
    let archive_path = params
        .archive_dir
        .join(archive_name(params.manifest.version));
    let write_error = |source| ArchiveError::WriteArchive {
        path: archive_path.clone(),
        source,
    };

    let mut staged = NamedTempFile::new_in(params.archive_dir).map_err(write_error)?;
    write_zip(staged.as_file_mut(), &sources)?;
    staged.as_file_mut().flush().map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;
    staged
        .persist(&archive_path)
        .map_err(|err| write_error(err.error))?;

    debug!("packaged {} files into {archive_path}", sources.len());
    Ok(archive_path)
}

/// A verified file and the name it takes inside the archive.
struct Source {
    name: String,
    path: Utf8PathBuf,
}

fn verify_sources(manifest: &Manifest, root: &Utf8Path) -> Result<Vec<Source>, ArchiveError> {
    manifest
        .files
        .iter()
        .map(|entry| {
            let path = root.join(&entry.path);
            let actual = compute_sha1(path.as_std_path()).map_err(|source| {
                ArchiveError::ReadFile {
                    path: path.clone(),
                    source,
                }
            })?;
            if actual != entry.sha1 {
                return Err(ArchiveError::StaleManifest {
                    path: entry.path.clone(),
                    expected: entry.sha1.clone(),
                    actual,
                });
            }
            Ok(Source {
                name: entry.path.clone(),
                path,
            })
        })
        .collect()
}

fn write_zip(file: &mut fs::File, sources: &[Source]) -> Result<(), ArchiveError> {
    // A fixed timestamp keeps archives of identical trees byte-identical.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut zip = ZipWriter::new(file);
    for source in sources {
        zip.start_file(source.name.as_str(), options)?;
        let mut input = fs::File::open(&source.path).map_err(|err| ArchiveError::ReadFile {
            path: source.path.clone(),
            source: err,
        })?;
        io::copy(&mut input, &mut zip).map_err(|err| ArchiveError::ReadFile {
            path: source.path.clone(),
            source: err,
        })?;
    }
    zip.finish()?;
    Ok(())
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
