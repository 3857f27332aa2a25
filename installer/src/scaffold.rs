//! Orchestration of the `new` command flow.
//!
//! Sequences the scaffolding pipeline: pre-flight destination check,
//! version resolution, cached download, archive materialization, writable
//! directory adjustment, and the Composer setup chain. Every collaborator
//! enters through a trait object so tests can run the whole flow without
//! network access or a real Composer installation.

use crate::archive::download::{ArchiveDownloader, FetchOutcome, fetch};
use crate::archive::extraction::ArchiveExtractor;
use crate::archive::materialize::materialize;
use crate::cache::CacheStore;
use crate::composer::{ProcessRunner, SetupOptions, find_composer, setup_command};
use crate::error::{InstallerError, Result};
use crate::fsops;
use crate::output::{
    cached_fallback_message, crafting_message, ready_message, writable_dirs_warning, write_line,
};
use crate::resolution::{ReleaseLister, VersionToken, resolve};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;

/// Conventional writable storage directory inside a new application.
pub const STORAGE_DIR: &str = "storage";

/// Conventional writable cache directory inside a new application.
pub const BOOTSTRAP_CACHE_DIR: &str = "bootstrap/cache";

/// What the user asked the `new` command to do.
#[derive(Debug, Clone, Default)]
pub struct ScaffoldRequest {
    /// Application directory name; absent or `.` means the working
    /// directory itself.
    pub name: Option<String>,
    /// Version to install.
    pub token: VersionToken,
    /// Install even when the destination already exists.
    pub force: bool,
    /// Forward `--no-ansi` to the Composer chain.
    pub no_ansi: bool,
    /// Suppress progress output and forward `--quiet` to Composer.
    pub quiet: bool,
    /// Emit per-step progress detail.
    pub verbose: bool,
}

/// Collaborators for one scaffolding run.
pub struct ScaffoldContext<'a> {
    /// Package cache for downloaded archives.
    pub cache: &'a CacheStore,
    /// Directory the command was invoked from.
    pub working_dir: &'a Utf8Path,
    /// Release listing source for range tokens.
    pub lister: &'a dyn ReleaseLister,
    /// Package archive downloader.
    pub downloader: &'a dyn ArchiveDownloader,
    /// Package archive extractor.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Shell runner for the Composer setup chain.
    pub runner: &'a dyn ProcessRunner,
}

/// Scaffold a new application according to the request.
///
/// # Errors
///
/// Returns the first fatal error in the pipeline; see the crate error type
/// for the full taxonomy. A failure after extraction can leave a partially
/// populated destination; nothing is rolled back.
pub fn scaffold(
    request: &ScaffoldRequest,
    context: &ScaffoldContext<'_>,
    output: &mut dyn Write,
) -> Result<()> {
    let destination = destination_dir(context.working_dir, request.name.as_deref());
    verify_destination_free(&destination, context.working_dir, request.force)?;

    progress(output, request.quiet, crafting_message());
    detail(
        output,
        request,
        format!("  - Using version {}", request.token),
    );

    let url = resolve(&request.token, context.lister)?;
    let archive_path = context.cache.archive_path(&request.token);

    detail(output, request, "  - Downloading package...");
    match fetch(context.downloader, &url, &archive_path)? {
        FetchOutcome::Downloaded => {}
        FetchOutcome::StaleCache { reason } => {
            progress(output, request.quiet, format!("Download failed: {reason}"));
            progress(output, request.quiet, cached_fallback_message());
        }
    }

    detail(output, request, "  - Extracting package...");
    materialize(
        &archive_path,
        &destination,
        context.working_dir,
        context.extractor,
    )?;

    prepare_writable_directories(&destination, output);

    detail(output, request, "  - Initializing application...");
    let composer = find_composer(context.working_dir);
    let chain = setup_command(
        &composer,
        SetupOptions {
            no_ansi: request.no_ansi,
            quiet: request.quiet,
        },
    );
    let code = context.runner.run_shell(&chain, &destination, output)?;
    if code != 0 {
        return Err(InstallerError::SetupFailed { code });
    }

    progress(output, request.quiet, ready_message());
    Ok(())
}

/// Destination directory for an application name.
///
/// An absent name or `.` targets the working directory itself.
#[must_use]
pub fn destination_dir(working_dir: &Utf8Path, name: Option<&str>) -> Utf8PathBuf {
    match name {
        Some(name) if !name.is_empty() && name != "." => working_dir.join(name),
        _ => working_dir.to_owned(),
    }
}

/// Fail when something already occupies a non-cwd destination.
///
/// Runs before any network activity; `--force` skips the check entirely.
fn verify_destination_free(
    destination: &Utf8Path,
    working_dir: &Utf8Path,
    force: bool,
) -> Result<()> {
    if force || destination == working_dir {
        return Ok(());
    }
    if destination.as_std_path().exists() {
        return Err(InstallerError::ApplicationExists {
            path: destination.to_owned(),
        });
    }
    Ok(())
}

/// Make the conventional writable directories group/owner-writable.
///
/// Failure here never aborts the run; the user gets a warning instead.
fn prepare_writable_directories(destination: &Utf8Path, output: &mut dyn Write) {
    let result = fsops::chmod_recursive(&destination.join(BOOTSTRAP_CACHE_DIR), 0o755)
        .and_then(|()| fsops::chmod_recursive(&destination.join(STORAGE_DIR), 0o755));
    if let Err(err) = result {
        log::warn!("could not adjust writable directories: {err}");
        write_line(output, writable_dirs_warning());
    }
}

fn progress(output: &mut dyn Write, quiet: bool, message: impl std::fmt::Display) {
    if !quiet {
        write_line(output, message);
    }
}

fn detail(output: &mut dyn Write, request: &ScaffoldRequest, message: impl std::fmt::Display) {
    if request.verbose && !request.quiet {
        write_line(output, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::named(Some("blog"), "/work/blog")]
    #[case::absent(None, "/work")]
    #[case::dot(Some("."), "/work")]
    #[case::empty(Some(""), "/work")]
    fn destination_follows_the_name_argument(
        #[case] name: Option<&str>,
        #[case] expected: &str,
    ) {
        let working_dir = Utf8Path::new("/work");
        assert_eq!(destination_dir(working_dir, name), expected);
    }

    #[test]
    fn occupied_destination_is_rejected_before_any_io() {
        let temp = tempfile::tempdir().expect("temp dir");
        let working_dir =
            Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("UTF-8 temp dir");
        let destination = working_dir.join("blog");
        std::fs::create_dir(destination.as_std_path()).expect("occupy destination");

        let err = verify_destination_free(&destination, &working_dir, false)
            .expect_err("destination occupied");
        assert!(matches!(err, InstallerError::ApplicationExists { .. }));
    }

    #[test]
    fn force_skips_the_destination_check() {
        let temp = tempfile::tempdir().expect("temp dir");
        let working_dir =
            Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("UTF-8 temp dir");
        let destination = working_dir.join("blog");
        std::fs::create_dir(destination.as_std_path()).expect("occupy destination");

        verify_destination_free(&destination, &working_dir, true).expect("force wins");
    }

    #[test]
    fn the_working_directory_itself_is_always_allowed() {
        let temp = tempfile::tempdir().expect("temp dir");
        let working_dir =
            Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("UTF-8 temp dir");

        verify_destination_free(&working_dir, &working_dir, false).expect("cwd allowed");
    }
}
