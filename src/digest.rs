//! SHA-1 content fingerprints for manifest entries.
//!
//! Manifests carry a `sha1` per file so that clients can tell which files
//! changed between releases. The algorithm is fixed to SHA-1 because
//! previously published manifests use it; switching would make every file
//! look changed.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Expected length of a hex-encoded SHA-1 digest.
const DIGEST_HEX_LEN: usize = 40;

/// Read buffer size used while streaming file content.
const CHUNK_SIZE: usize = 8192;

/// Errors arising from invalid digest strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The value is not a 40-character lowercase hex string.
    #[error("invalid SHA-1 digest: {reason}")]
    InvalidSha1Digest {
        /// Description of the validation failure.
        reason: String,
    },
}

/// A validated hex-encoded SHA-1 digest string.
///
/// # Examples
///
/// ```
/// use modpack::digest::Sha1Digest;
///
/// let hex = "c22b5f9178342609428d6f51b2c5af4c0bde6a42";
/// let digest = Sha1Digest::try_from(hex).expect("valid digest");
/// assert_eq!(digest.as_str(), hex);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha1Digest(String);

impl Sha1Digest {
    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    fn from_hasher(hasher: Sha1) -> Self {
        // Lowercase hex of a 20-byte output always satisfies the invariant.
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl TryFrom<&str> for Sha1Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_sha1(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha1Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_sha1(&value)?;
        Ok(Self(value))
    }
}

impl From<Sha1Digest> for String {
    fn from(digest: Sha1Digest) -> Self {
        digest.0
    }
}

impl AsRef<str> for Sha1Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha1Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the SHA-1 digest of a file.
///
/// The file is read in fixed-size chunks so large assets are never held in
/// memory. The handle is closed when this function returns, on success and
/// on error alike.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn compute_sha1(path: &Path) -> std::io::Result<Sha1Digest> {
    let file = fs::File::open(path)?;
    sha1_of_reader(file)
}

/// Compute the SHA-1 digest of everything `reader` yields.
///
/// # Errors
///
/// Returns the underlying I/O error if reading fails.
///
/// # Examples
///
/// ```
/// use modpack::digest::sha1_of_reader;
///
/// let digest = sha1_of_reader(&b"hi"[..]).expect("in-memory read");
/// assert_eq!(digest.as_str(), "c22b5f9178342609428d6f51b2c5af4c0bde6a42");
/// ```
pub fn sha1_of_reader(mut reader: impl Read) -> std::io::Result<Sha1Digest> {
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha1Digest::from_hasher(hasher))
}

/// Validate that `value` is a well-formed hex-encoded SHA-1 digest.
fn validate_sha1(value: &str) -> Result<(), DigestError> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(DigestError::InvalidSha1Digest {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DigestError::InvalidSha1Digest {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(DigestError::InvalidSha1Digest {
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}
