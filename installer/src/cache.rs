//! Local archive cache for downloaded application packages.
//!
//! The cache is one flat directory of zip archives named after the version
//! token they were downloaded for. Its root comes from the
//! `LANTERN_CACHE_DIR` environment variable when set, otherwise a `cache`
//! subdirectory beside the installer executable. The directory is used
//! without locking; concurrent invocations are unsupported.

use crate::error::{InstallerError, Result};
use crate::resolution::VersionToken;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Environment variable overriding the cache root directory.
pub const CACHE_DIR_ENV: &str = "LANTERN_CACHE_DIR";

/// A package cache rooted at one fixed directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: Utf8PathBuf,
}

impl CacheStore {
    /// Create a cache store rooted at the given directory.
    #[must_use]
    pub fn at(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the cache root from the environment.
    ///
    /// Honours [`CACHE_DIR_ENV`] when set and non-empty; otherwise uses a
    /// `cache` directory beside the current executable.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::CacheUnavailable`] when the executable
    /// path cannot be determined or is not valid UTF-8.
    pub fn from_env() -> Result<Self> {
        if let Ok(root) = std::env::var(CACHE_DIR_ENV) {
            if !root.is_empty() {
                return Ok(Self::at(root));
            }
        }

        let exe = std::env::current_exe().map_err(|e| InstallerError::CacheUnavailable {
            reason: e.to_string(),
        })?;
        let exe = Utf8PathBuf::try_from(exe).map_err(|e| InstallerError::CacheUnavailable {
            reason: format!("executable path is not valid UTF-8: {e}"),
        })?;
        let root = exe
            .parent()
            .map(|dir| dir.join("cache"))
            .ok_or_else(|| InstallerError::CacheUnavailable {
                reason: "executable has no parent directory".to_owned(),
            })?;
        Ok(Self::at(root))
    }

    /// The cache root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of a named cache entry; an empty name yields the root.
    #[must_use]
    pub fn entry_path(&self, name: &str) -> Utf8PathBuf {
        if name.is_empty() {
            self.root.clone()
        } else {
            self.root.join(name)
        }
    }

    /// Cache path for the archive belonging to a version token.
    #[must_use]
    pub fn archive_path(&self, token: &VersionToken) -> Utf8PathBuf {
        self.entry_path(&format!("lantern-{}.zip", token.as_str()))
    }

    /// Names of all cache entries, sorted. A missing root lists as empty.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than a missing root directory.
    pub fn list(&self) -> Result<Vec<String>> {
        let reader = match self.root.read_dir_utf8() {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in reader {
            names.push(entry.map_err(InstallerError::Io)?.file_name().to_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Remove one named cache entry.
    ///
    /// # Errors
    ///
    /// Propagates the underlying I/O error, including `NotFound` for an
    /// entry that does not exist.
    pub fn delete(&self, name: &str) -> Result<()> {
        fs::remove_file(self.entry_path(name).as_std_path())?;
        Ok(())
    }

    /// Remove every cache entry.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered while listing or deleting.
    pub fn clear(&self) -> Result<()> {
        for name in self.list()? {
            self.delete(&name)?;
        }
        Ok(())
    }
}
