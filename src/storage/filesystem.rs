//! File system helpers
//!
//! Thin wrappers over `std::fs` used by the storage operations.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;

/// Attempts made for removals that fail with `PermissionDenied`
pub const MAX_RETRIES: u32 = 3;

/// Check if a regular file exists (symlinks followed)
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Check if a directory exists (symlinks followed)
pub fn directory_exists(path: &Path) -> bool {
    path.is_dir()
}

/// Copies `content` into `target` through an anonymous temporary file in the
/// same directory, so the target is either the old file or the complete new one.
///
/// The temporary file is removed if anything fails before it is persisted.
pub fn write_via_temp<R: Read>(target: &Path, content: &mut R) -> io::Result<u64> {
    let parent = target.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", target.display()),
        )
    })?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    let written = io::copy(content, &mut temp_file)?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(target).map_err(|e| e.error)?;

    Ok(written)
}

/// Removes every entry beneath `dir`, leaving `dir` itself in place.
///
/// Symlinks are unlinked, never followed.
pub fn clear_directory(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            retry_on_permission_denied(|| fs::remove_dir_all(&path))?;
        } else {
            retry_on_permission_denied(|| fs::remove_file(&path))?;
        }
    }
    Ok(())
}

/// Runs `op`, retrying with a growing delay while it fails with `PermissionDenied`.
///
/// Covers files briefly held open by another process (antivirus, indexers).
pub fn retry_on_permission_denied<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if attempt < MAX_RETRIES && e.kind() == io::ErrorKind::PermissionDenied => {
                thread::sleep(Duration::from_millis(100 * u64::from(attempt)));
                attempt += 1;
            }
            result => return result,
        }
    }
}
