//! Error types for the Lantern installer CLI.
//!
//! This module defines semantic error variants that provide actionable
//! guidance when scaffolding fails. Each error includes a recovery hint
//! where one exists.

use crate::archive::download::DownloadError;
use crate::resolution::ResolveError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while scaffolding an application or managing the
/// package cache.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The destination directory (or a file of the same name) already exists.
    #[error("application already exists at {path}; pass --force to install anyway")]
    ApplicationExists {
        /// The occupied destination path.
        path: Utf8PathBuf,
    },

    /// Version resolution failed (listing unavailable or no matching release).
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The package download failed with no cached archive to fall back on.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The downloaded file is not a well-formed application package.
    #[error("invalid application package; verify that you can access {hint_url}")]
    InvalidPackage {
        /// Download URL to suggest checking for connectivity problems.
        hint_url: String,
    },

    /// An archive entry attempted to escape the extraction directory.
    #[error("archive entry escapes the extraction directory: {path}")]
    UnsafeArchiveEntry {
        /// The offending entry path from the archive.
        path: String,
    },

    /// The cache root directory could not be determined.
    #[error("cache directory unavailable: {reason}")]
    CacheUnavailable {
        /// Description of why the cache root could not be resolved.
        reason: String,
    },

    /// The process working directory could not be resolved.
    #[error("could not resolve working directory: {reason}")]
    WorkingDirectory {
        /// Description of the underlying failure.
        reason: String,
    },

    /// The Composer setup chain exited with a non-zero status.
    #[error("application setup failed: dependency manager exited with status {code}")]
    SetupFailed {
        /// Exit code reported by the setup chain.
        code: i32,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
