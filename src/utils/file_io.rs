use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::Result;
use crate::StorageError;

/// Create `dir` (and parents) if missing and restrict it to the owner
/// (mode 0700).
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(StorageError::IoError)?;
    }
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700)).map_err(StorageError::IoError)?;
    Ok(())
}

/// Replace the file at `path` with `contents` atomically.
///
/// Writes to a temp file in the same directory, sets `mode`, syncs, then
/// renames into place. On any failure the temp file is dropped and the
/// previous file at `path` is left untouched; a concurrent reader never
/// observes a partial write.
pub fn atomic_replace(
    path: &Path,
    contents: &[u8],
    mode: u32,
) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(StorageError::IoError)?;
    tmp.write_all(contents).map_err(StorageError::IoError)?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(mode))
        .map_err(StorageError::IoError)?;
    tmp.as_file().sync_all().map_err(StorageError::IoError)?;

    tmp.persist(path).map_err(|e| StorageError::PersistError {
        path: path.display().to_string(),
        source: e.error,
    })?;

    debug!(path = %path.display(), bytes = contents.len(), "file replaced");
    Ok(())
}
