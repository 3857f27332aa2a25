//! Zip archive validation and extraction.
//!
//! Extracts application packages to a target directory with path traversal
//! protection to prevent zip-slip attacks. A file that is not a well-formed
//! zip archive is reported distinctly so callers can surface it as a failed
//! or corrupted download.

use camino::Utf8Path;

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The file is not a well-formed zip archive.
    #[error("not a valid zip archive: {reason}")]
    InvalidArchive {
        /// Description of the zip-level failure.
        reason: String,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for extracting package archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`, creating it
    /// if needed. Returns the number of files unpacked.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidArchive`] when the file is not a
    /// zip archive, [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory, and
    /// [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Utf8Path, dest_dir: &Utf8Path)
    -> Result<usize, ExtractionError>;
}

/// Default extractor using the `zip` crate.
///
/// Validates each entry path before unpacking to guard against path
/// traversal attacks (zip-slip).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Utf8Path,
        dest_dir: &Utf8Path,
    ) -> Result<usize, ExtractionError> {
        let file = std::fs::File::open(archive_path.as_std_path())?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| ExtractionError::InvalidArchive {
                reason: e.to_string(),
            })?;

        std::fs::create_dir_all(dest_dir.as_std_path())?;

        let mut unpacked = 0usize;
        for index in 0..archive.len() {
            let mut entry =
                archive
                    .by_index(index)
                    .map_err(|e| ExtractionError::InvalidArchive {
                        reason: e.to_string(),
                    })?;

            let Some(relative) = entry.enclosed_name() else {
                return Err(ExtractionError::PathTraversal {
                    path: entry.name().to_owned(),
                });
            };
            let target = dest_dir.as_std_path().join(relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&target)?;
                continue;
            }

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = std::fs::File::create(&target)?;
            std::io::copy(&mut entry, &mut out)?;
            restore_unix_mode(&target, entry.unix_mode())?;
            unpacked += 1;
        }

        log::debug!("unpacked {unpacked} files from {archive_path}");
        Ok(unpacked)
    }
}

/// Reapply the entry's recorded permission bits, when present.
#[cfg(unix)]
fn restore_unix_mode(path: &std::path::Path, mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restore_unix_mode(_path: &std::path::Path, _mode: Option<u32>) -> std::io::Result<()> {
    Ok(())
}
