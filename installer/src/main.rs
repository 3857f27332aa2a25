//! Lantern installer CLI entrypoint.
//!
//! This binary scaffolds new Lantern applications and manages the local
//! package cache. Fatal errors are printed to stderr; the exit code is the
//! Composer chain's own exit code when application setup fails, and 1 for
//! every other failure.

use camino::Utf8PathBuf;
use clap::Parser;
use lantern_installer::archive::download::{ArchiveDownloader, FetchOutcome, HttpDownloader, fetch};
use lantern_installer::archive::extraction::ZipExtractor;
use lantern_installer::cache::CacheStore;
use lantern_installer::cli::{CacheArgs, Cli, Command, NewArgs};
use lantern_installer::composer::SystemProcessRunner;
use lantern_installer::error::{InstallerError, Result};
use lantern_installer::output::{cached_fallback_message, versions_listing, write_line};
use lantern_installer::resolution::{
    HttpReleaseLister, KNOWN_VERSIONS, ReleaseLister, VersionToken, resolve,
};
use lantern_installer::scaffold::{ScaffoldContext, ScaffoldRequest, scaffold};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::New(args) => run_new(args, stderr),
        Command::Cache(args) => run_cache(args, stderr),
        Command::CacheClear => run_cache_clear(stderr),
        Command::Versions => run_versions(),
    }
}

/// Scaffold a new application with the production collaborators.
fn run_new(args: &NewArgs, stderr: &mut dyn Write) -> Result<()> {
    let cache = CacheStore::from_env()?;
    let working_dir = current_working_dir()?;

    let request = ScaffoldRequest {
        name: args.name.clone(),
        token: args.version_token(),
        force: args.force,
        no_ansi: args.no_ansi,
        quiet: args.quiet,
        verbose: args.verbosity > 0,
    };
    let context = ScaffoldContext {
        cache: &cache,
        working_dir: &working_dir,
        lister: &HttpReleaseLister,
        downloader: &HttpDownloader,
        extractor: &ZipExtractor,
        runner: &SystemProcessRunner,
    };

    scaffold(&request, &context, stderr)
}

/// Pre-populate the cache with the requested versions.
fn run_cache(args: &CacheArgs, stderr: &mut dyn Write) -> Result<()> {
    let cache = CacheStore::from_env()?;

    if args.clean {
        cache.clear()?;
        write_line(stderr, "Cache cleared.");
    }

    let lister = HttpReleaseLister;
    let downloader = HttpDownloader;
    for token in requested_tokens(args) {
        write_line(stderr, format!("Downloading Lantern package ({token})..."));
        download_into_cache(&cache, &token, &lister, &downloader, stderr)?;
    }

    write_line(stderr, "Finished.");
    Ok(())
}

/// Resolve one token and fetch its archive into the cache.
fn download_into_cache(
    cache: &CacheStore,
    token: &VersionToken,
    lister: &dyn ReleaseLister,
    downloader: &dyn ArchiveDownloader,
    stderr: &mut dyn Write,
) -> Result<()> {
    let url = resolve(token, lister)?;
    let dest = cache.archive_path(token);
    match fetch(downloader, &url, &dest)? {
        FetchOutcome::Downloaded => {}
        FetchOutcome::StaleCache { reason } => {
            write_line(stderr, format!("Download failed: {reason}"));
            write_line(stderr, cached_fallback_message());
        }
    }
    Ok(())
}

/// Tokens the `cache` command should download.
fn requested_tokens(args: &CacheArgs) -> Vec<VersionToken> {
    if args.all {
        KNOWN_VERSIONS.iter().map(|v| VersionToken::parse(v)).collect()
    } else if args.versions.is_empty() {
        vec![VersionToken::Master]
    } else {
        args.versions.iter().map(|v| VersionToken::parse(v)).collect()
    }
}

fn run_cache_clear(stderr: &mut dyn Write) -> Result<()> {
    CacheStore::from_env()?.clear()?;
    write_line(stderr, "Cache cleared.");
    Ok(())
}

fn run_versions() -> Result<()> {
    let mut stdout = std::io::stdout();
    write_line(&mut stdout, versions_listing());
    Ok(())
}

/// The invocation directory as a UTF-8 path.
fn current_working_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| InstallerError::WorkingDirectory {
        reason: e.to_string(),
    })?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|cwd| InstallerError::WorkingDirectory {
        reason: format!("{} is not valid UTF-8", cwd.display()),
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            let code = error_exit_code(&err);
            write_line(stderr, &err);
            code
        }
    }
}

/// The Composer chain's exit code propagates; everything else exits 1.
fn error_exit_code(err: &InstallerError) -> i32 {
    match err {
        InstallerError::SetupFailed { code } => *code,
        _ => 1,
    }
}
