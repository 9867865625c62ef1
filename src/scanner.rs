//! Deterministic traversal of the modpack tree.
//!
//! The scanner walks the root depth-first with entries sorted by file name at
//! every level, so two scans of an unchanged tree list files in the same
//! order. Ignored directories are pruned before their contents are read.

use crate::error::{BuildError, Result};
use crate::ignore::IgnoreSet;
use camino::{Utf8Path, Utf8PathBuf};
use log::trace;
use std::path::{Component, Path};
use walkdir::{DirEntry, WalkDir};

/// A regular file discovered below the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Path relative to the root, `/`-separated.
    pub relative: String,
    /// Path on disk, suitable for opening.
    pub absolute: Utf8PathBuf,
}

/// List every regular file below `root` that no rule in `rules` excludes.
///
/// Symbolic links are followed. Files are returned in traversal order.
/// Errors raised for ignored entries, such as a dangling or looping link
/// that a rule excludes, are skipped.
///
/// # Errors
///
/// Returns [`BuildError::Walk`] when a directory cannot be read,
/// [`BuildError::SymlinkLoop`] when following links revisits an ancestor,
/// and [`BuildError::NonUtf8Path`] when an entry name is not valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use modpack::ignore::IgnoreSet;
/// use modpack::scanner::scan;
///
/// let rules = IgnoreSet::from_patterns([".git"]);
/// for file in scan(Utf8Path::new("./pack"), &rules)? {
///     println!("{}", file.relative);
/// }
/// # Ok::<(), modpack::error::BuildError>(())
/// ```
pub fn scan(root: &Utf8Path, rules: &IgnoreSet) -> Result<Vec<ScannedFile>> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_pruned(root, entry, rules));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_ignored_failure(root, &err, rules) => continue,
            Err(err) => return Err(walk_error(err)),
        };
        if entry.depth() == 0 || !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_posix(root.as_std_path(), entry.path())
            .ok_or_else(|| BuildError::NonUtf8Path(entry.path().to_path_buf()))?;
        let absolute = Utf8PathBuf::from_path_buf(entry.into_path())
            .map_err(BuildError::NonUtf8Path)?;
        trace!("scanned {relative}");
        files.push(ScannedFile { relative, absolute });
    }
    Ok(files)
}

fn is_pruned(root: &Utf8Path, entry: &DirEntry, rules: &IgnoreSet) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    // Entries with non-UTF-8 names are kept so the main loop can report them.
    let Some(relative) = relative_posix(root.as_std_path(), entry.path()) else {
        return false;
    };
    let pruned = rules.should_ignore(&relative);
    if pruned {
        trace!("ignored {relative}");
    }
    pruned
}

/// Walk errors are raised before `filter_entry` sees the entry, so ignore
/// rules are applied to the failing path here.
fn is_ignored_failure(root: &Utf8Path, err: &walkdir::Error, rules: &IgnoreSet) -> bool {
    let Some(relative) = err
        .path()
        .and_then(|path| relative_posix(root.as_std_path(), path))
    else {
        return false;
    };
    let ignored = !relative.is_empty() && rules.should_ignore(&relative);
    if ignored {
        trace!("ignored unreadable entry {relative}");
    }
    ignored
}

fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(segments.join("/"))
}

fn walk_error(err: walkdir::Error) -> BuildError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    if let Some(ancestor) = err.loop_ancestor() {
        return BuildError::SymlinkLoop {
            path,
            ancestor: ancestor.to_path_buf(),
        };
    }
    BuildError::Walk { path, source: err }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    struct Tree {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    impl Tree {
        fn file(&self, relative: &str, content: &str) {
            let path = self.root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(path, content).expect("write file");
        }
    }

    #[fixture]
    fn tree() -> Tree {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir");
        Tree { _dir: dir, root }
    }

    fn relatives(files: &[ScannedFile]) -> Vec<&str> {
        files.iter().map(|file| file.relative.as_str()).collect()
    }

    #[rstest]
    fn lists_files_sorted_with_forward_slashes(tree: Tree) {
        tree.file("mods/sodium.jar", "s");
        tree.file("config/sodium.json", "{}");
        tree.file("b.txt", "b");
        tree.file("a.txt", "a");

        let files = scan(&tree.root, &IgnoreSet::new()).expect("scan succeeds");

        assert_eq!(
            relatives(&files),
            vec!["a.txt", "b.txt", "config/sodium.json", "mods/sodium.jar"]
        );
        let first = files.first().expect("one file");
        assert_eq!(first.absolute, tree.root.join("a.txt"));
    }

    #[rstest]
    fn empty_root_yields_no_files(tree: Tree) {
        let files = scan(&tree.root, &IgnoreSet::new()).expect("scan succeeds");
        assert!(files.is_empty());
    }

    #[rstest]
    fn directories_are_not_listed(tree: Tree) {
        fs::create_dir_all(tree.root.join("empty/nested")).expect("mkdir");
        tree.file("kept.txt", "k");

        let files = scan(&tree.root, &IgnoreSet::new()).expect("scan succeeds");

        assert_eq!(relatives(&files), vec!["kept.txt"]);
    }

    #[rstest]
    fn ignore_rules_exclude_every_form(tree: Tree) {
        tree.file("a.txt", "hi");
        tree.file("ignored/b.txt", "b");
        tree.file("mods/.DS_Store", "x");
        tree.file("config/local.toml", "x");
        tree.file("config/shared.toml", "x");
        let rules = IgnoreSet::from_patterns(["ignored/", ".DS_Store", "config/local.toml"]);

        let files = scan(&tree.root, &rules).expect("scan succeeds");

        assert_eq!(relatives(&files), vec!["a.txt", "config/shared.toml"]);
    }

    #[rstest]
    fn prefix_rules_stop_at_segment_boundaries(tree: Tree) {
        tree.file("ignored/b.txt", "b");
        tree.file("ignored2.txt", "kept");
        tree.file("notignored/c.txt", "kept");

        let rules = IgnoreSet::from_patterns(["ignored/"]);
        let files = scan(&tree.root, &rules).expect("scan succeeds");

        assert_eq!(relatives(&files), vec!["ignored2.txt", "notignored/c.txt"]);
    }

    #[cfg(unix)]
    #[rstest]
    fn pruned_directories_are_never_read(tree: Tree) {
        use std::os::unix::fs::PermissionsExt;

        tree.file("a.txt", "hi");
        tree.file("locked/secret.txt", "s");
        let locked = tree.root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");

        let rules = IgnoreSet::from_patterns(["locked/"]);
        let result = scan(&tree.root, &rules);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore");
        assert_eq!(relatives(&result.expect("scan succeeds")), vec!["a.txt"]);
    }

    #[cfg(unix)]
    #[rstest]
    fn symlinked_files_are_followed(tree: Tree) {
        tree.file("shared/options.txt", "fov:90");
        std::os::unix::fs::symlink(
            tree.root.join("shared/options.txt"),
            tree.root.join("options.txt"),
        )
        .expect("symlink");

        let files = scan(&tree.root, &IgnoreSet::new()).expect("scan succeeds");

        assert_eq!(relatives(&files), vec!["options.txt", "shared/options.txt"]);
    }

    #[cfg(unix)]
    #[rstest]
    fn symlink_cycles_are_fatal(tree: Tree) {
        fs::create_dir_all(tree.root.join("mods")).expect("mkdir");
        std::os::unix::fs::symlink(&tree.root, tree.root.join("mods/loop")).expect("symlink");

        let err = scan(&tree.root, &IgnoreSet::new()).expect_err("cycle must fail");

        assert!(matches!(err, BuildError::SymlinkLoop { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[rstest]
    fn ignored_dangling_link_is_skipped(tree: Tree) {
        tree.file("a.txt", "hi");
        std::os::unix::fs::symlink(tree.root.join("gone"), tree.root.join("cache.lnk"))
            .expect("symlink");

        let rules = IgnoreSet::from_patterns(["cache.lnk"]);
        let files = scan(&tree.root, &rules).expect("scan succeeds");

        assert_eq!(relatives(&files), vec!["a.txt"]);
    }

    #[cfg(unix)]
    #[rstest]
    fn ignored_loop_link_is_skipped(tree: Tree) {
        tree.file("a.txt", "hi");
        std::os::unix::fs::symlink(&tree.root, tree.root.join("loop")).expect("symlink");

        let rules = IgnoreSet::from_patterns(["loop/"]);
        let files = scan(&tree.root, &rules).expect("scan succeeds");

        assert_eq!(relatives(&files), vec!["a.txt"]);
    }

    #[cfg(unix)]
    #[rstest]
    fn unignored_dangling_link_is_fatal(tree: Tree) {
        tree.file("a.txt", "hi");
        std::os::unix::fs::symlink(tree.root.join("gone"), tree.root.join("cache.lnk"))
            .expect("symlink");

        let rules = IgnoreSet::from_patterns(["other.lnk"]);
        let err = scan(&tree.root, &rules).expect_err("dangling link must fail");

        assert!(matches!(err, BuildError::Walk { .. }), "got {err:?}");
    }

    #[test]
    fn relative_posix_joins_segments() {
        let rel = relative_posix(Path::new("/pack"), Path::new("/pack/mods/a.jar"));
        assert_eq!(rel.as_deref(), Some("mods/a.jar"));
    }

    #[test]
    fn relative_posix_rejects_foreign_paths() {
        assert_eq!(relative_posix(Path::new("/pack"), Path::new("/other/a.jar")), None);
    }
}
