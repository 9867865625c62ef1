//! Atomic file replacement.

use camino::Utf8Path;
use std::io::{self, Write};
use tempfile::NamedTempFile;

/// Replace `path` with `contents` so readers never observe a partial file.
///
/// The bytes go to a temporary file in the destination directory, which is
/// synced and then renamed over the target. On failure the temporary file is
/// removed and the target is left as it was.
pub(crate) fn write_atomic(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}
