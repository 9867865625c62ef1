//! Immutable build and release configuration.
//!
//! Configuration is assembled once at start-up by merging the built-in
//! defaults with an optional `modpack.toml` settings document, then passed
//! explicitly to the builder and the publisher. Every settings key is
//! optional; a present key replaces its default and absent keys keep it.
//!
//! Output paths (`manifest_file`, `version_file`, `archive_dir`) are resolved
//! against the modpack root unless they are absolute.

use crate::ignore::{IgnoreRule, IgnoreSet};
use crate::manifest::ManifestMetadata;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "modpack.toml";

/// Errors raised while loading the settings document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings {path}: {source}")]
    Read {
        /// Location of the settings file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or contains unknown keys.
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        /// Location of the settings file.
        path: Utf8PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Modpack identity and file layout.
    pub modpack: ModpackConfig,
    /// Raw ignore patterns, in evaluation order.
    pub ignore_patterns: Vec<String>,
    /// Release publishing options.
    pub release: ReleaseConfig,
}

/// Modpack identity and file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModpackConfig {
    /// Display name, used in the manifest and the release title.
    pub name: String,
    /// Minecraft version the pack targets.
    pub mc_version: String,
    /// Mod loader.
    pub loader: String,
    /// Optional loader version.
    pub loader_version: Option<String>,
    /// Optional Java version.
    pub java_version: Option<String>,
    /// Directory tree to scan.
    pub root: Utf8PathBuf,
    /// Manifest file name, relative to the root.
    pub manifest_file: Utf8PathBuf,
    /// Version file name, relative to the root.
    pub version_file: Utf8PathBuf,
}

/// Release publishing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// Repository in `owner/name` form.
    pub repository: String,
    /// Prefix prepended to the version to form the tag.
    pub tag_prefix: String,
    /// Directory receiving release archives, relative to the root.
    pub archive_dir: Utf8PathBuf,
    /// Ring the terminal bell when a release completes.
    pub notify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modpack: ModpackConfig {
                name: "Terereland".to_owned(),
                mc_version: "1.20.1".to_owned(),
                loader: "fabric".to_owned(),
                loader_version: None,
                java_version: None,
                root: Utf8PathBuf::from("./"),
                manifest_file: Utf8PathBuf::from("modpack.json"),
                version_file: Utf8PathBuf::from("version.txt"),
            },
            ignore_patterns: [
                ".DS_Store",
                "__pycache__",
                ".git",
                ".github",
                ".gitignore",
                "build_modpack.py",
                "release_modpack.py",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            release: ReleaseConfig {
                repository: "ZTormDev/Terereland-Modpack-Releases".to_owned(),
                tag_prefix: "v".to_owned(),
                archive_dir: Utf8PathBuf::from("releases"),
                notify: true,
            },
        }
    }
}

impl Config {
    /// Merge a settings document over `defaults`.
    ///
    /// # Examples
    ///
    /// ```
    /// use modpack::config::{Config, Settings};
    ///
    /// let settings: Settings = toml::from_str("[modpack]\nname = \"Other\"\n")?;
    /// let config = Config::from_settings(Config::default(), settings);
    /// assert_eq!(config.modpack.name, "Other");
    /// assert_eq!(config.modpack.loader, "fabric");
    /// # Ok::<(), toml::de::Error>(())
    /// ```
    #[must_use]
    pub fn from_settings(defaults: Self, settings: Settings) -> Self {
        let Self {
            modpack,
            ignore_patterns,
            release,
        } = defaults;
        let overrides = settings.modpack;
        let release_overrides = settings.release;

        Self {
            modpack: ModpackConfig {
                name: overrides.name.unwrap_or(modpack.name),
                mc_version: overrides.mc_version.unwrap_or(modpack.mc_version),
                loader: overrides.loader.unwrap_or(modpack.loader),
                loader_version: overrides.loader_version.or(modpack.loader_version),
                java_version: overrides.java_version.or(modpack.java_version),
                root: overrides.root.unwrap_or(modpack.root),
                manifest_file: overrides.manifest_file.unwrap_or(modpack.manifest_file),
                version_file: overrides.version_file.unwrap_or(modpack.version_file),
            },
            ignore_patterns: settings.ignore.patterns.unwrap_or(ignore_patterns),
            release: ReleaseConfig {
                repository: release_overrides.repository.unwrap_or(release.repository),
                tag_prefix: release_overrides.tag_prefix.unwrap_or(release.tag_prefix),
                archive_dir: release_overrides.archive_dir.unwrap_or(release.archive_dir),
                notify: release_overrides.notify.unwrap_or(release.notify),
            },
        }
    }

    /// Location of the manifest file.
    #[must_use]
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.resolve(&self.modpack.manifest_file)
    }

    /// Location of the version file.
    #[must_use]
    pub fn version_path(&self) -> Utf8PathBuf {
        self.resolve(&self.modpack.version_file)
    }

    /// Directory receiving release archives.
    #[must_use]
    pub fn archive_dir(&self) -> Utf8PathBuf {
        self.resolve(&self.release.archive_dir)
    }

    /// Descriptive manifest fields.
    #[must_use]
    pub fn metadata(&self) -> ManifestMetadata {
        ManifestMetadata {
            modpack_name: self.modpack.name.clone(),
            mc_version: self.modpack.mc_version.clone(),
            loader: self.modpack.loader.clone(),
            loader_version: self.modpack.loader_version.clone(),
            java_version: self.modpack.java_version.clone(),
        }
    }

    /// Build the effective ignore rules.
    ///
    /// The user patterns come first. The manifest and version files are
    /// always excluded, and so is the archive directory when it lies inside
    /// the root, so a build never lists its own outputs.
    #[must_use]
    pub fn ignore_set(&self) -> IgnoreSet {
        let mut rules = IgnoreSet::from_patterns(&self.ignore_patterns);
        for reserved in [&self.modpack.manifest_file, &self.modpack.version_file] {
            if let Some(rule) = within_root(reserved).and_then(IgnoreRule::parse) {
                rules.push(rule);
            }
        }
        let archive_rule = within_root(&self.release.archive_dir)
            .and_then(|dir| IgnoreRule::parse(&format!("{dir}/")));
        if let Some(rule) = archive_rule {
            rules.push(rule);
        }
        rules
    }

    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.modpack.root.join(path)
        }
    }
}

fn within_root(path: &Utf8Path) -> Option<&str> {
    (path.is_relative() && !path.as_str().split(['/', '\\']).any(|part| part == ".."))
        .then(|| path.as_str())
}

/// Settings document as written in `modpack.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `[modpack]` table.
    pub modpack: ModpackSettings,
    /// `[ignore]` table.
    pub ignore: IgnoreSettings,
    /// `[release]` table.
    pub release: ReleaseSettings,
}

/// Overrides for [`ModpackConfig`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ModpackSettings {
    /// Display name.
    pub name: Option<String>,
    /// Minecraft version.
    pub mc_version: Option<String>,
    /// Mod loader.
    pub loader: Option<String>,
    /// Loader version.
    pub loader_version: Option<String>,
    /// Java version.
    pub java_version: Option<String>,
    /// Directory tree to scan.
    pub root: Option<Utf8PathBuf>,
    /// Manifest file name.
    pub manifest_file: Option<Utf8PathBuf>,
    /// Version file name.
    pub version_file: Option<Utf8PathBuf>,
}

/// Overrides for the ignore list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IgnoreSettings {
    /// Replaces the default pattern list when present.
    pub patterns: Option<Vec<String>>,
}

/// Overrides for [`ReleaseConfig`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseSettings {
    /// Repository in `owner/name` form.
    pub repository: Option<String>,
    /// Tag prefix.
    pub tag_prefix: Option<String>,
    /// Archive directory.
    pub archive_dir: Option<Utf8PathBuf>,
    /// Completion bell.
    pub notify: Option<bool>,
}

/// Load the settings document at `path` (or [`DEFAULT_SETTINGS_FILE`]) and
/// merge it over `defaults`.
///
/// A missing file is not an error: the defaults are used and a warning is
/// logged.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] when the file exists but cannot be read and
/// [`ConfigError::Parse`] when it is not a valid settings document.
pub fn load_config(defaults: Config, path: Option<&Utf8Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Utf8Path::new(DEFAULT_SETTINGS_FILE));
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("settings file {path} not found; using built-in defaults");
            return Ok(defaults);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let settings: Settings = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded settings from {path}");
    Ok(Config::from_settings(defaults, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct SettingsDir {
        _dir: TempDir,
        path: Utf8PathBuf,
    }

    impl SettingsDir {
        fn write(&self, contents: &str) -> &Utf8Path {
            std::fs::write(&self.path, contents).expect("write settings");
            &self.path
        }
    }

    #[fixture]
    fn settings_dir() -> SettingsDir {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("modpack.toml")).expect("UTF-8");
        SettingsDir { _dir: dir, path }
    }

    #[rstest]
    fn defaults_match_the_published_pack() {
        let config = Config::default();

        assert_eq!(config.modpack.name, "Terereland");
        assert_eq!(config.modpack.mc_version, "1.20.1");
        assert_eq!(config.modpack.loader, "fabric");
        assert_eq!(config.manifest_path(), Utf8PathBuf::from("./modpack.json"));
        assert_eq!(config.version_path(), Utf8PathBuf::from("./version.txt"));
        assert_eq!(config.release.repository, "ZTormDev/Terereland-Modpack-Releases");
        assert!(config.release.notify);
    }

    #[rstest]
    fn absent_keys_keep_defaults() {
        let source = "[modpack]\nloader_version = \"0.15.11\"\n\n[release]\nnotify = false\n";
        let settings: Settings = toml::from_str(source).expect("valid settings");

        let config = Config::from_settings(Config::default(), settings);

        assert_eq!(config.modpack.loader_version.as_deref(), Some("0.15.11"));
        assert_eq!(config.modpack.name, "Terereland");
        assert!(!config.release.notify);
        assert_eq!(config.release.tag_prefix, "v");
        assert_eq!(config.ignore_patterns, Config::default().ignore_patterns);
    }

    #[rstest]
    fn ignore_patterns_replace_the_whole_list() {
        let settings: Settings =
            toml::from_str("[ignore]\npatterns = [\"logs/\"]\n").expect("valid settings");

        let config = Config::from_settings(Config::default(), settings);

        assert_eq!(config.ignore_patterns, vec!["logs/".to_owned()]);
    }

    #[rstest]
    #[case::top_level("colour = \"red\"\n")]
    #[case::nested("[modpack]\nauthor = \"someone\"\n")]
    fn unknown_keys_are_rejected(#[case] source: &str) {
        assert!(toml::from_str::<Settings>(source).is_err());
    }

    #[rstest]
    fn missing_file_falls_back_to_defaults(settings_dir: SettingsDir) {
        let config = load_config(Config::default(), Some(&settings_dir.path)).expect("fallback");
        assert_eq!(config, Config::default());
    }

    #[rstest]
    fn present_file_is_merged(settings_dir: SettingsDir) {
        let path = settings_dir.write("[modpack]\nroot = \"pack\"\n");

        let config = load_config(Config::default(), Some(path)).expect("load");

        assert_eq!(config.manifest_path(), Utf8PathBuf::from("pack/modpack.json"));
    }

    #[rstest]
    fn unparsable_file_is_fatal(settings_dir: SettingsDir) {
        let path = settings_dir.write("[modpack\nname = ");

        let err = load_config(Config::default(), Some(path)).expect_err("parse failure");

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[rstest]
    fn ignore_set_always_excludes_build_outputs() {
        let mut config = Config::default();
        config.ignore_patterns.clear();

        let rules = config.ignore_set();

        assert!(rules.should_ignore("modpack.json"));
        assert!(rules.should_ignore("version.txt"));
        assert!(rules.should_ignore("releases/modpack_v1.0.1.zip"));
        assert!(!rules.should_ignore("mods/sodium.jar"));
    }

    #[rstest]
    fn absolute_outputs_are_not_turned_into_rules() {
        let mut config = Config::default();
        config.ignore_patterns.clear();
        config.release.archive_dir = Utf8PathBuf::from("/var/releases");
        config.modpack.version_file = Utf8PathBuf::from("../version.txt");

        let rules = config.ignore_set();

        assert_eq!(rules.rules(), &[IgnoreRule::Basename("modpack.json".to_owned())]);
        assert_eq!(config.archive_dir(), Utf8PathBuf::from("/var/releases"));
    }
}
