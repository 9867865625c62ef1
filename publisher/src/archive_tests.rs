//! Unit tests for release archive packaging.

use super::*;
use modpack::builder::{BuildParams, build_manifest};
use modpack::config::Config;
use rstest::{fixture, rstest};
use std::io::Read;
use tempfile::TempDir;

struct BuiltPack {
    _dir: TempDir,
    root: Utf8PathBuf,
    manifest: Manifest,
}

impl BuiltPack {
    fn archive_dir(&self) -> Utf8PathBuf {
        self.root.join("releases")
    }

    fn package(&self) -> Result<Utf8PathBuf, ArchiveError> {
        let archive_dir = self.archive_dir();
        package_release(ArchiveParams {
            manifest: &self.manifest,
            root: &self.root,
            archive_dir: &archive_dir,
        })
    }
}

#[fixture]
fn built_pack() -> BuiltPack {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir");
    for (relative, content) in [
        ("mods/sodium.jar", "sodium"),
        ("config/sodium.json", "{\"fps\": true}"),
        ("options.txt", "fov:90"),
    ] {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }
    let mut config = Config::default();
    config.modpack.root = root.clone();
    let output = build_manifest(&BuildParams::from_config(&config)).expect("build succeeds");
    BuiltPack {
        _dir: dir,
        root,
        manifest: output.manifest,
    }
}

fn entry_names(path: &Utf8Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(fs::File::open(path).expect("open")).expect("zip");
    let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    names.sort();
    names
}

#[rstest]
fn archive_contains_exactly_the_manifest_files(built_pack: BuiltPack) {
    let path = built_pack.package().expect("packaging succeeds");

    assert_eq!(path.file_name(), Some("modpack_v1.0.1.zip"));
    assert_eq!(
        entry_names(&path),
        vec!["config/sodium.json", "mods/sodium.jar", "options.txt"]
    );
}

#[rstest]
fn archive_entries_hold_file_content(built_pack: BuiltPack) {
    let path = built_pack.package().expect("packaging succeeds");

    let mut archive = zip::ZipArchive::new(fs::File::open(&path).expect("open")).expect("zip");
    let mut entry = archive.by_name("options.txt").expect("entry present");
    let mut content = String::new();
    entry.read_to_string(&mut content).expect("read entry");
    assert_eq!(content, "fov:90");
    assert_eq!(entry.compression(), CompressionMethod::Deflated);
}

#[rstest]
fn repackaging_replaces_the_previous_archive(built_pack: BuiltPack) {
    let first = built_pack.package().expect("first packaging");
    let second = built_pack.package().expect("second packaging");

    assert_eq!(first, second);
    let leftovers = fs::read_dir(built_pack.archive_dir()).expect("list").count();
    assert_eq!(leftovers, 1);
}

#[rstest]
fn changed_file_is_reported_as_stale(built_pack: BuiltPack) {
    fs::write(built_pack.root.join("options.txt"), "fov:110").expect("modify");

    let err = built_pack.package().expect_err("stale manifest");

    assert!(
        matches!(&err, ArchiveError::StaleManifest { path, .. } if path == "options.txt"),
        "got {err:?}"
    );
    assert!(!built_pack.archive_dir().exists());
}

#[rstest]
fn removed_file_is_a_read_error(built_pack: BuiltPack) {
    fs::remove_file(built_pack.root.join("mods/sodium.jar")).expect("remove");

    let err = built_pack.package().expect_err("missing file");

    assert!(matches!(err, ArchiveError::ReadFile { .. }), "got {err:?}");
}

#[test]
fn archive_name_embeds_the_version() {
    assert_eq!(archive_name(Version::new(2, 3, 8)), "modpack_v2.3.8.zip");
}
