//! Archive materialization: unpack a package and relocate it into place.
//!
//! The extraction directory is derived deterministically from the archive
//! file stem, so repeated runs against the same cache entry reuse the same
//! name; any stale tree from an interrupted run is removed first. After
//! extraction, a package wrapping everything in a single `lantern*`
//! directory is unwrapped; anything else is moved wholesale.

use crate::archive::extraction::{ArchiveExtractor, ExtractionError};
use crate::error::{InstallerError, Result};
use crate::fsops;
use crate::resolution::CABINET_LATEST_URL;
use camino::{Utf8Path, Utf8PathBuf};

/// Case-insensitive prefix identifying the framework skeleton directory
/// inside release archives.
pub const TEMPLATE_DIR_PREFIX: &str = "lantern";

/// Unpack `archive_path` and move its contents to `destination`.
///
/// The temporary extraction directory is created inside `work_dir`. When
/// the archive's top level is exactly one directory named after the
/// framework skeleton, that directory's contents become `destination`;
/// otherwise the extraction directory is moved wholesale. Existing files
/// at `destination` are merged over, never cleared first. The archive file
/// itself is kept; it doubles as the cache entry.
///
/// # Errors
///
/// Returns [`InstallerError::InvalidPackage`] for a malformed archive
/// (with a connectivity hint, since that usually means a failed download),
/// and surfaces filesystem errors from extraction or the move verbatim.
pub fn materialize(
    archive_path: &Utf8Path,
    destination: &Utf8Path,
    work_dir: &Utf8Path,
    extractor: &dyn ArchiveExtractor,
) -> Result<()> {
    let extraction_dir = extraction_dir_for(archive_path, work_dir)?;
    if extraction_dir.as_std_path().exists() {
        fsops::remove_dir_recursive(&extraction_dir)?;
    }

    match extractor.extract(archive_path, &extraction_dir) {
        Ok(_) => {}
        Err(ExtractionError::InvalidArchive { reason }) => {
            log::debug!("rejected package {archive_path}: {reason}");
            return Err(InstallerError::InvalidPackage {
                hint_url: CABINET_LATEST_URL.to_owned(),
            });
        }
        Err(ExtractionError::PathTraversal { path }) => {
            return Err(InstallerError::UnsafeArchiveEntry { path });
        }
        Err(ExtractionError::Io(err)) => return Err(InstallerError::Io(err)),
    }

    if let Some(wrapper) = single_template_dir(&extraction_dir)? {
        fsops::move_dir_contents(&wrapper, destination)?;
    } else {
        fsops::move_dir_contents(&extraction_dir, destination)?;
    }
    fsops::remove_dir_recursive(&extraction_dir)?;
    Ok(())
}

/// Extraction directory for an archive: its file stem under `work_dir`.
fn extraction_dir_for(archive_path: &Utf8Path, work_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let stem = archive_path
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| InstallerError::InvalidPackage {
            hint_url: CABINET_LATEST_URL.to_owned(),
        })?;
    Ok(work_dir.join(stem))
}

/// When the directory holds exactly one entry, and that entry is a
/// directory named after the framework skeleton, return its path.
fn single_template_dir(dir: &Utf8Path) -> Result<Option<Utf8PathBuf>> {
    let mut entries = Vec::new();
    for entry in dir.read_dir_utf8().map_err(InstallerError::Io)? {
        entries.push(entry.map_err(InstallerError::Io)?);
    }
    if entries.len() != 1 {
        return Ok(None);
    }
    let Some(entry) = entries.pop() else {
        return Ok(None);
    };
    let named_after_template = entry
        .file_name()
        .to_lowercase()
        .starts_with(TEMPLATE_DIR_PREFIX);
    if entry.file_type().map_err(InstallerError::Io)?.is_dir() && named_after_template {
        Ok(Some(entry.path().to_owned()))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::extraction::ZipExtractor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn utf8_temp_dir(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir")
    }

    fn write_zip(path: &Utf8Path, entries: &[(&str, &str)]) {
        let file = std::fs::File::create(path.as_std_path()).expect("create archive");
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer
                .write_all(contents.as_bytes())
                .expect("write entry");
        }
        writer.finish().expect("finish archive");
    }

    #[test]
    fn unwraps_single_template_directory() {
        let temp = tempfile::tempdir().expect("temp dir");
        let work = utf8_temp_dir(&temp);
        let archive = work.join("lantern-master.zip");
        write_zip(
            &archive,
            &[
                ("lantern-master/readme.md", "hello"),
                ("lantern-master/app/kernel.php", "<?php"),
            ],
        );

        let destination = work.join("blog");
        materialize(&archive, &destination, &work, &ZipExtractor).expect("materialize");

        assert!(destination.join("readme.md").as_std_path().is_file());
        assert!(destination.join("app/kernel.php").as_std_path().is_file());
        assert!(!destination.join("lantern-master").as_std_path().exists());
        // Extraction directory is consumed; the archive doubles as cache.
        assert!(!work.join("lantern-master").as_std_path().exists());
        assert!(archive.as_std_path().is_file());
    }

    #[test]
    fn template_prefix_match_is_case_insensitive() {
        let temp = tempfile::tempdir().expect("temp dir");
        let work = utf8_temp_dir(&temp);
        let archive = work.join("lantern-7.zip");
        write_zip(&archive, &[("Lantern-7.2.0/readme.md", "hello")]);

        let destination = work.join("blog");
        materialize(&archive, &destination, &work, &ZipExtractor).expect("materialize");

        assert!(destination.join("readme.md").as_std_path().is_file());
    }

    #[test]
    fn flat_archive_moves_wholesale() {
        let temp = tempfile::tempdir().expect("temp dir");
        let work = utf8_temp_dir(&temp);
        let archive = work.join("lantern-develop.zip");
        write_zip(
            &archive,
            &[("readme.md", "hello"), ("composer.json", "{}")],
        );

        let destination = work.join("blog");
        materialize(&archive, &destination, &work, &ZipExtractor).expect("materialize");

        assert!(destination.join("readme.md").as_std_path().is_file());
        assert!(destination.join("composer.json").as_std_path().is_file());
    }

    #[test]
    fn single_non_template_directory_is_kept_as_is() {
        let temp = tempfile::tempdir().expect("temp dir");
        let work = utf8_temp_dir(&temp);
        let archive = work.join("lantern-auth.zip");
        write_zip(&archive, &[("vendor-dump/readme.md", "hello")]);

        let destination = work.join("blog");
        materialize(&archive, &destination, &work, &ZipExtractor).expect("materialize");

        assert!(
            destination
                .join("vendor-dump/readme.md")
                .as_std_path()
                .is_file()
        );
    }

    #[test]
    fn invalid_archive_reports_package_error_and_leaves_destination_alone() {
        let temp = tempfile::tempdir().expect("temp dir");
        let work = utf8_temp_dir(&temp);
        let archive = work.join("lantern-master.zip");
        std::fs::write(archive.as_std_path(), b"corrupt download").expect("write");

        let destination = work.join("blog");
        let err = materialize(&archive, &destination, &work, &ZipExtractor)
            .expect_err("invalid package");

        assert!(matches!(err, InstallerError::InvalidPackage { .. }));
        assert!(!destination.as_std_path().exists());
    }

    #[test]
    fn stale_extraction_directory_is_replaced() {
        let temp = tempfile::tempdir().expect("temp dir");
        let work = utf8_temp_dir(&temp);
        let archive = work.join("lantern-master.zip");
        write_zip(&archive, &[("lantern-master/readme.md", "fresh")]);

        // Simulate a leftover tree from an interrupted run.
        let stale = work.join("lantern-master/old-junk");
        std::fs::create_dir_all(stale.as_std_path()).expect("stale tree");

        let destination = work.join("blog");
        materialize(&archive, &destination, &work, &ZipExtractor).expect("materialize");

        assert!(destination.join("readme.md").as_std_path().is_file());
        assert!(!destination.join("old-junk").as_std_path().exists());
    }
}
