//! Explicit recursive filesystem tree operations.
//!
//! Archive materialization needs merge-moves and tree deletion with
//! deterministic ordering: files are removed before directories, deepest
//! directories first. Both walks use an owned work stack rather than
//! relying on any iteration-order guarantee from the platform.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Move every entry under `source` into `destination`, preserving the
/// subdirectory structure.
///
/// Existing destination files are overwritten; other destination content
/// is left in place (merge semantics, not atomic replacement). The emptied
/// `source` directory skeleton is left behind for the caller to remove.
///
/// # Errors
///
/// Returns the first I/O error encountered; the move is not rolled back.
pub fn move_dir_contents(source: &Utf8Path, destination: &Utf8Path) -> io::Result<()> {
    fs::create_dir_all(destination.as_std_path())?;

    let mut pending: Vec<Utf8PathBuf> = vec![source.to_owned()];
    while let Some(dir) = pending.pop() {
        for entry in dir.read_dir_utf8()? {
            let entry = entry?;
            let relative = entry.path().strip_prefix(source).map_err(|_| {
                io::Error::other(format!("entry {} is outside {}", entry.path(), source))
            })?;
            let target = destination.join(relative);

            if entry.file_type()?.is_dir() {
                fs::create_dir_all(target.as_std_path())?;
                pending.push(entry.path().to_owned());
            } else {
                if target.as_std_path().exists() {
                    fs::remove_file(target.as_std_path())?;
                }
                fs::rename(entry.path().as_std_path(), target.as_std_path())?;
            }
        }
    }
    Ok(())
}

/// Delete `root` and everything beneath it.
///
/// Files are removed as each directory is scanned; directories are removed
/// afterwards in reverse discovery order, which guarantees children before
/// parents.
///
/// # Errors
///
/// Returns the first I/O error encountered.
pub fn remove_dir_recursive(root: &Utf8Path) -> io::Result<()> {
    let mut pending: Vec<Utf8PathBuf> = vec![root.to_owned()];
    let mut directories: Vec<Utf8PathBuf> = Vec::new();

    while let Some(dir) = pending.pop() {
        for entry in dir.read_dir_utf8()? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                pending.push(entry.path().to_owned());
            } else {
                fs::remove_file(entry.path().as_std_path())?;
            }
        }
        directories.push(dir);
    }

    for dir in directories.iter().rev() {
        fs::remove_dir(dir.as_std_path())?;
    }
    Ok(())
}

/// Recursively set permission bits on `root` and everything beneath it.
///
/// # Errors
///
/// Returns the first I/O error encountered, including a missing `root`.
#[cfg(unix)]
pub fn chmod_recursive(root: &Utf8Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut pending: Vec<Utf8PathBuf> = vec![root.to_owned()];
    while let Some(path) = pending.pop() {
        fs::set_permissions(path.as_std_path(), fs::Permissions::from_mode(mode))?;
        if path.as_std_path().is_dir() {
            for entry in path.read_dir_utf8()? {
                pending.push(entry?.path().to_owned());
            }
        }
    }
    Ok(())
}

/// Permission adjustment is a Unix concern; elsewhere this is a no-op.
#[cfg(not(unix))]
pub fn chmod_recursive(_root: &Utf8Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
