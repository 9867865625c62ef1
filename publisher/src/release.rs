//! GitHub Releases client.
//!
//! Publishing happens in three calls: create a draft release, upload each
//! asset to it, then flip it to published. The [`ReleaseApi`] trait lets the
//! publish flow be exercised without network access.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::sync::OnceLock;
use std::time::Duration;

/// Base URL of the GitHub REST API.
const API_BASE: &str = "https://api.github.com";

/// Media type GitHub recommends for REST requests.
const ACCEPT: &str = "application/vnd.github+json";

/// Network timeout for each release API request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors arising from release API calls.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// The request could not be sent or the response could not be read.
    #[error("{operation} failed: {reason}")]
    Http {
        /// The API operation being performed.
        operation: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The service answered with a non-success status.
    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        /// The API operation being performed.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the service.
        body: String,
    },

    /// A success response did not have the expected shape.
    #[error("{operation} returned an unexpected response: {source}")]
    Parse {
        /// The API operation being performed.
        operation: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An asset could not be read for upload.
    #[error("failed to read asset {path}: {source}")]
    Asset {
        /// The asset on disk.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Payload of the create-release call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRequest {
    /// Git tag the release is attached to.
    pub tag_name: String,
    /// Release title.
    pub name: String,
    /// Release notes.
    pub body: String,
    /// Whether the release starts as a draft.
    pub draft: bool,
    /// Whether the release is marked as a pre-release.
    pub prerelease: bool,
}

/// A release created by [`ReleaseApi::create_draft`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DraftRelease {
    /// Numeric release identifier.
    pub id: u64,
    /// RFC 6570 template for asset uploads.
    pub upload_url: String,
    /// Browser URL of the release, when reported.
    #[serde(default)]
    pub html_url: Option<String>,
}

impl DraftRelease {
    /// Upload endpoint with the URI template suffix removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use modpack_publisher::release::DraftRelease;
    ///
    /// let release = DraftRelease {
    ///     id: 1,
    ///     upload_url: "https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}".into(),
    ///     html_url: None,
    /// };
    /// assert_eq!(
    ///     release.upload_endpoint(),
    ///     "https://uploads.github.com/repos/o/r/releases/1/assets"
    /// );
    /// ```
    #[must_use]
    pub fn upload_endpoint(&self) -> &str {
        self.upload_url
            .split('{')
            .next()
            .unwrap_or(&self.upload_url)
    }
}

/// Operations against a release hosting service.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseApi {
    /// Create a release from `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn create_draft(&self, request: &ReleaseRequest) -> Result<DraftRelease, ReleaseError>;

    /// Upload the file at `asset` to `release`, named after its file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the upload fails.
    fn upload_asset(&self, release: &DraftRelease, asset: &Utf8Path) -> Result<(), ReleaseError>;

    /// Mark `release` as published.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    fn publish(&self, release: &DraftRelease) -> Result<(), ReleaseError>;
}

/// [`ReleaseApi`] backed by the GitHub REST API over `ureq`.
pub struct GithubReleaseApi {
    repository: String,
    token: String,
}

impl GithubReleaseApi {
    /// Create a client for `repository` (`owner/name`) authenticated by
    /// `token`.
    #[must_use]
    pub fn new(repository: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            token: token.into(),
        }
    }

    /// URL of the repository's release collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use modpack_publisher::release::GithubReleaseApi;
    ///
    /// let api = GithubReleaseApi::new("owner/pack", "token");
    /// assert_eq!(api.releases_url(), "https://api.github.com/repos/owner/pack/releases");
    /// ```
    #[must_use]
    pub fn releases_url(&self) -> String {
        format!("{API_BASE}/repos/{}/releases", self.repository)
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token)
    }
}

impl ReleaseApi for GithubReleaseApi {
    fn create_draft(&self, request: &ReleaseRequest) -> Result<DraftRelease, ReleaseError> {
        let operation = "create release";
        let payload = to_json(operation, request)?;
        let response = http_agent()
            .post(&self.releases_url())
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT)
            .header("Content-Type", "application/json")
            .send(payload)
            .map_err(|err| map_ureq_error(operation, &err))?;
        let body = success_body(operation, response)?;
        serde_json::from_str(&body).map_err(|source| ReleaseError::Parse {
            operation: operation.to_owned(),
            source,
        })
    }

    fn upload_asset(&self, release: &DraftRelease, asset: &Utf8Path) -> Result<(), ReleaseError> {
        let name = asset.file_name().unwrap_or(asset.as_str());
        let operation = format!("upload {name}");
        let (mut file, length) = open_asset(asset)?;
        let response = http_agent()
            .post(release.upload_endpoint())
            .query("name", name)
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Length", length.to_string())
            .send(ureq::SendBody::from_reader(&mut file))
            .map_err(|err| map_ureq_error(&operation, &err))?;
        success_body(&operation, response).map(drop)
    }

    fn publish(&self, release: &DraftRelease) -> Result<(), ReleaseError> {
        let operation = "publish release";
        let payload = to_json(operation, &serde_json::json!({ "draft": false }))?;
        let response = http_agent()
            .patch(&format!("{}/{}", self.releases_url(), release.id))
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT)
            .header("Content-Type", "application/json")
            .send(payload)
            .map_err(|err| map_ureq_error(operation, &err))?;
        success_body(operation, response).map(drop)
    }
}

/// Open an asset for streaming and report its size; GitHub requires a
/// `Content-Length` on uploads.
fn open_asset(asset: &Utf8Path) -> Result<(File, u64), ReleaseError> {
    let to_error = |source: std::io::Error| ReleaseError::Asset {
        path: asset.to_string(),
        source,
    };
    let file = File::open(asset).map_err(to_error)?;
    let length = file.metadata().map_err(to_error)?.len();
    Ok((file, length))
}

fn to_json(operation: &str, value: &impl Serialize) -> Result<String, ReleaseError> {
    serde_json::to_string(value).map_err(|source| ReleaseError::Parse {
        operation: operation.to_owned(),
        source,
    })
}

/// Read the response body, failing on non-success statuses.
fn success_body(
    operation: &str,
    response: ureq::http::Response<ureq::Body>,
) -> Result<String, ReleaseError> {
    let status = response.status();
    let body = response
        .into_body()
        .read_to_string()
        .map_err(|err| map_ureq_error(operation, &err))?;
    check_status(operation, status.as_u16(), body)
}

fn check_status(operation: &str, status: u16, body: String) -> Result<String, ReleaseError> {
    if (200..300).contains(&status) {
        return Ok(body);
    }
    Err(ReleaseError::Status {
        operation: operation.to_owned(),
        status,
        body,
    })
}

/// Shared `ureq` agent; statuses are checked by [`success_body`] so error
/// bodies stay readable.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`ReleaseError`].
fn map_ureq_error(operation: &str, err: &ureq::Error) -> ReleaseError {
    match err {
        ureq::Error::StatusCode(status) => ReleaseError::Status {
            operation: operation.to_owned(),
            status: *status,
            body: String::new(),
        },
        other => ReleaseError::Http {
            operation: operation.to_owned(),
            reason: other.to_string(),
        },
    }
}
