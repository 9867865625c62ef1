//! Semantic versions and the version file that stores them.
//!
//! The version file holds exactly `major.minor.patch` with no trailing
//! newline. Builds read it leniently: a missing or malformed file is not an
//! error, the build simply starts again from `1.0.0`.

use crate::atomic::write_atomic;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when a version string or file cannot be used.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The text does not have the `major.minor.patch` shape.
    #[error("invalid version {value:?}: {reason}")]
    Invalid {
        /// The rejected text, trimmed.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The version file is absent.
    #[error("version file {path} does not exist")]
    Missing {
        /// Location of the version file.
        path: Utf8PathBuf,
    },

    /// The version file exists but could not be read.
    #[error("failed to read version file {path}: {source}")]
    Read {
        /// Location of the version file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// A `major.minor.patch` release number.
///
/// # Examples
///
/// ```
/// use modpack::version::Version;
///
/// let version: Version = "2.3.7".parse().expect("valid version");
/// assert_eq!(version.next().to_string(), "2.3.8");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl Version {
    /// The version a fresh modpack starts from.
    pub const INITIAL: Self = Self::new(1, 0, 0);

    /// Create a version from its components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Return the next release: patch plus one, major and minor unchanged.
    ///
    /// The patch component saturates at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            patch: self.patch.saturating_add(1),
            ..self
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        let invalid = |reason: &str| VersionError::Invalid {
            value: value.to_owned(),
            reason: reason.to_owned(),
        };

        let parts: Vec<&str> = value.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(invalid("expected three dot-separated components"));
        };
        let component = |text: &str| -> Result<u64, VersionError> {
            if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(invalid("components must be ASCII digits"));
            }
            text.parse()
                .map_err(|_| invalid("component exceeds the supported range"))
        };

        Ok(Self::new(
            component(*major)?,
            component(*minor)?,
            component(*patch)?,
        ))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// Where the version returned by [`VersionStore::read`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// The file held a valid version.
    Stored,
    /// The file does not exist yet.
    Missing,
    /// The file held text that is not a version.
    Malformed,
    /// The file exists but could not be read.
    Unreadable,
}

impl VersionSource {
    /// Return true when the version was a fallback rather than stored.
    #[must_use]
    pub fn is_fallback(self) -> bool {
        !matches!(self, Self::Stored)
    }
}

/// Result of a lenient version file read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRead {
    /// The stored version, or [`Version::INITIAL`] on fallback.
    pub version: Version,
    /// How the version was obtained.
    pub source: VersionSource,
}

/// Reads and writes the version file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStore {
    path: Utf8PathBuf,
}

impl VersionStore {
    /// Create a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the version file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the stored version, falling back to [`Version::INITIAL`].
    ///
    /// This never fails. A malformed or unreadable file is reported through
    /// a warning and [`VersionRead::source`].
    #[must_use]
    pub fn read(&self) -> VersionRead {
        let fallback = |source| VersionRead {
            version: Version::INITIAL,
            source,
        };
        match std::fs::read_to_string(&self.path) {
            Ok(text) => match text.parse::<Version>() {
                Ok(version) => VersionRead {
                    version,
                    source: VersionSource::Stored,
                },
                Err(err) => {
                    log::warn!("{err}; starting from {}", Version::INITIAL);
                    fallback(VersionSource::Malformed)
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no version file at {}", self.path);
                fallback(VersionSource::Missing)
            }
            Err(err) => {
                log::warn!(
                    "cannot read version file {}: {err}; starting from {}",
                    self.path,
                    Version::INITIAL
                );
                fallback(VersionSource::Unreadable)
            }
        }
    }

    /// Read the stored version, treating any problem as an error.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Missing`] when the file is absent,
    /// [`VersionError::Read`] when it cannot be read and
    /// [`VersionError::Invalid`] when its content is not a version.
    pub fn read_strict(&self) -> Result<Version, VersionError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                VersionError::Missing {
                    path: self.path.clone(),
                }
            } else {
                VersionError::Read {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;
        text.parse()
    }

    /// Atomically replace the file with `version`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; the previous file is left intact.
    pub fn write(&self, version: &Version) -> io::Result<()> {
        write_atomic(&self.path, version.to_string().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Scratch {
        _dir: TempDir,
        store: VersionStore,
    }

    #[fixture]
    fn scratch() -> Scratch {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir");
        Scratch {
            store: VersionStore::new(root.join("version.txt")),
            _dir: dir,
        }
    }

    #[rstest]
    #[case("1.0.0", Version::new(1, 0, 0))]
    #[case("2.3.7", Version::new(2, 3, 7))]
    #[case("  10.20.30\n", Version::new(10, 20, 30))]
    #[case("01.2.3", Version::new(1, 2, 3))]
    fn parses_valid_versions(#[case] text: &str, #[case] expected: Version) {
        assert_eq!(text.parse::<Version>().expect("valid"), expected);
    }

    #[rstest]
    #[case::word("not-a-version")]
    #[case::two_parts("1.2")]
    #[case::four_parts("1.2.3.4")]
    #[case::empty("")]
    #[case::empty_component("1..3")]
    #[case::sign("1.-2.3")]
    #[case::prerelease("1.2.3-beta")]
    #[case::overflow("1.2.99999999999999999999999")]
    #[case::unicode_digit("1.2.٣")]
    fn rejects_malformed_versions(#[case] text: &str) {
        assert!(matches!(
            text.parse::<Version>(),
            Err(VersionError::Invalid { .. })
        ));
    }

    #[test]
    fn next_increments_patch_only() {
        let version = Version::INITIAL.next().next().next();
        assert_eq!(version, Version::new(1, 0, 3));
    }

    #[test]
    fn next_saturates_patch() {
        let version = Version::new(1, 2, u64::MAX);
        assert_eq!(version.next(), version);
    }

    #[test]
    fn serialises_as_string() {
        let json = serde_json::to_string(&Version::new(2, 3, 8)).expect("serialise");
        assert_eq!(json, "\"2.3.8\"");
        let back: Version = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, Version::new(2, 3, 8));
    }

    #[rstest]
    fn missing_file_falls_back(scratch: Scratch) {
        let read = scratch.store.read();
        assert_eq!(read.version, Version::INITIAL);
        assert_eq!(read.source, VersionSource::Missing);
        assert!(read.source.is_fallback());
    }

    #[rstest]
    fn malformed_file_falls_back(scratch: Scratch) {
        std::fs::write(scratch.store.path(), "not-a-version").expect("seed");
        let read = scratch.store.read();
        assert_eq!(read.version, Version::INITIAL);
        assert_eq!(read.source, VersionSource::Malformed);
    }

    #[rstest]
    fn unreadable_file_falls_back(scratch: Scratch) {
        // A directory in place of the file cannot be read as text.
        std::fs::create_dir(scratch.store.path()).expect("mkdir");
        let read = scratch.store.read();
        assert_eq!(read.version, Version::INITIAL);
        assert_eq!(read.source, VersionSource::Unreadable);
    }

    #[rstest]
    fn stored_version_is_read(scratch: Scratch) {
        std::fs::write(scratch.store.path(), "2.3.7\n").expect("seed");
        let read = scratch.store.read();
        assert_eq!(read.version, Version::new(2, 3, 7));
        assert_eq!(read.source, VersionSource::Stored);
    }

    #[rstest]
    fn write_stores_exact_text(scratch: Scratch) {
        scratch
            .store
            .write(&Version::new(2, 3, 8))
            .expect("write succeeds");
        let text = std::fs::read_to_string(scratch.store.path()).expect("read back");
        assert_eq!(text, "2.3.8");
    }

    #[rstest]
    fn strict_read_reports_missing_file(scratch: Scratch) {
        assert!(matches!(
            scratch.store.read_strict(),
            Err(VersionError::Missing { .. })
        ));
    }

    #[rstest]
    fn strict_read_rejects_malformed_file(scratch: Scratch) {
        std::fs::write(scratch.store.path(), "v1").expect("seed");
        assert!(matches!(
            scratch.store.read_strict(),
            Err(VersionError::Invalid { .. })
        ));
    }
}
