//! Release publish flow.
//!
//! Publishing takes an already built tree to a published release:
//!
//! 1. read the version file and the manifest and check they agree;
//! 2. package the manifest's files into the release archive;
//! 3. create a draft release;
//! 4. upload the version file, the manifest and the archive;
//! 5. publish the draft.
//!
//! The flow stops at the first failing step. A draft created before a
//! failure is left in place for inspection.

use crate::archive::{ArchiveParams, package_release};
use crate::error::{PublisherError, Result};
use crate::release::{DraftRelease, ReleaseApi, ReleaseRequest};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use log::info;
use modpack::config::Config;
use modpack::manifest::Manifest;
use modpack::version::{Version, VersionStore};
use std::io::Write;

/// Environment variable holding the GitHub token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Summary of a completed release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// The version that was released.
    pub version: Version,
    /// The archive that was uploaded.
    pub archive_path: Utf8PathBuf,
    /// The release as reported when it was created.
    pub release: DraftRelease,
}

/// Read the API token from [`TOKEN_VAR`].
///
/// # Errors
///
/// Returns [`PublisherError::MissingToken`] when the variable is unset,
/// blank or not valid Unicode.
pub fn read_token() -> Result<String> {
    std::env::var(TOKEN_VAR)
        .ok()
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
        .ok_or(PublisherError::MissingToken {
            variable: TOKEN_VAR,
        })
}

/// Build the create-release payload for `version`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use modpack::config::Config;
/// use modpack::version::Version;
/// use modpack_publisher::publish::release_request;
///
/// let now = Utc
///     .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
///     .single()
///     .expect("valid timestamp");
/// let request = release_request(&Config::default(), Version::new(1, 0, 4), now);
/// assert_eq!(request.tag_name, "v1.0.4");
/// assert_eq!(request.name, "Terereland Modpack 1.0.4");
/// assert!(request.draft);
/// ```
#[must_use]
pub fn release_request(config: &Config, version: Version, now: DateTime<Utc>) -> ReleaseRequest {
    let modpack = &config.modpack;
    ReleaseRequest {
        tag_name: format!("{}{version}", config.release.tag_prefix),
        name: format!("{} Modpack {version}", modpack.name),
        body: format!(
            "Automated release of {} {version} for Minecraft {} ({}).\n\nBuilt {} UTC.",
            modpack.name,
            modpack.mc_version,
            modpack.loader,
            now.format("%Y-%m-%d %H:%M:%S"),
        ),
        draft: true,
        prerelease: false,
    }
}

/// Check that the manifest and version file describe the same build and
/// return that version.
///
/// # Errors
///
/// Returns [`PublisherError::VersionFile`], [`PublisherError::ManifestRead`]
/// or [`PublisherError::VersionMismatch`].
pub fn load_consistent_build(config: &Config) -> Result<(Version, Manifest)> {
    let version = VersionStore::new(config.version_path()).read_strict()?;
    let manifest = Manifest::load(&config.manifest_path())?;
    if manifest.version != version {
        return Err(PublisherError::VersionMismatch {
            manifest: manifest.version,
            version_file: version,
        });
    }
    Ok((version, manifest))
}

/// Publish the built tree described by `config` through `api`.
///
/// Progress lines are written to `progress`.
///
/// # Errors
///
/// Returns the first error raised by any step; later steps are not run.
pub fn publish_release(
    config: &Config,
    api: &dyn ReleaseApi,
    now: DateTime<Utc>,
    progress: &mut dyn Write,
) -> Result<PublishOutcome> {
    let (version, manifest) = load_consistent_build(config)?;

    let archive_dir = config.archive_dir();
    let archive_path = package_release(ArchiveParams {
        manifest: &manifest,
        root: &config.modpack.root,
        archive_dir: &archive_dir,
    })?;
    write_progress_line(progress, format!("Packaged {archive_path}"));

    let request = release_request(config, version, now);
    let release = api.create_draft(&request)?;
    write_progress_line(
        progress,
        format!("Created draft release {} ({})", request.name, request.tag_name),
    );

    for asset in [config.version_path(), config.manifest_path(), archive_path.clone()] {
        api.upload_asset(&release, &asset)?;
        write_progress_line(progress, format!("Uploaded {asset}"));
    }

    api.publish(&release)?;
    info!("published release {} of {}", request.tag_name, config.release.repository);
    write_progress_line(progress, format!("Published {}", request.name));

    Ok(PublishOutcome {
        version,
        archive_path,
        release,
    })
}

fn write_progress_line(progress: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(progress, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
