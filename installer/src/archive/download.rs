//! Package download with a stale-cache fallback policy.
//!
//! Provides a trait-based abstraction for downloading package archives,
//! enabling dependency injection for testing, plus the fetch policy that
//! tolerates connection failures when a previously cached archive exists.

use camino::Utf8Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout for package downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors arising from package download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The server was reached but answered with an error status.
    #[error("download failed for {url}: HTTP status {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The server could not be reached at all (DNS, refused, timeout).
    #[error("could not connect to {url}: {reason}")]
    Connect {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for downloading a package archive to a file.
///
/// Abstraction allows tests to exercise the fetch policy without network
/// access.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveDownloader {
    /// Download `url` and write the body to `dest`, overwriting any
    /// existing file. Missing parent directories are created first.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] describing the connection, status, or
    /// write failure.
    fn download(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError>;
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl ArchiveDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(DownloadError::Io)?;
        Ok(())
    }
}

/// The outcome of a fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A fresh archive was downloaded to the destination.
    Downloaded,
    /// The download could not connect, but an archive from a prior run
    /// exists at the destination; the caller proceeds with the stale file.
    StaleCache {
        /// Why the download failed.
        reason: String,
    },
}

/// Fetch `url` to `dest`, falling back to a pre-existing file on
/// connection failure.
///
/// Only connection-level failures qualify for the fallback; an HTTP error
/// status means the server was reachable and is always fatal.
///
/// # Errors
///
/// Returns the underlying [`DownloadError`] when the download fails and no
/// cached file exists at `dest`.
pub fn fetch(
    downloader: &dyn ArchiveDownloader,
    url: &str,
    dest: &Utf8Path,
) -> Result<FetchOutcome, DownloadError> {
    match downloader.download(url, dest) {
        Ok(()) => Ok(FetchOutcome::Downloaded),
        Err(DownloadError::Connect { reason, .. }) if dest.is_file() => {
            log::warn!("download failed ({reason}); using cached archive at {dest}");
            Ok(FetchOutcome::StaleCache { reason })
        }
        Err(err) => Err(err),
    }
}

/// Shared `ureq` agent with request timeout configuration.
pub(crate) fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(status) => DownloadError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => DownloadError::Connect {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn connect_error() -> DownloadError {
        DownloadError::Connect {
            url: "https://cabinet.lantern-php.dev/latest.zip".to_owned(),
            reason: "connection refused".to_owned(),
        }
    }

    fn utf8_temp_dir(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir")
    }

    #[test]
    fn map_ureq_error_maps_status_code() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/latest.zip", &err);
        assert!(matches!(mapped, DownloadError::Status { status: 404, .. }));
    }

    #[test]
    fn fetch_reports_downloaded_on_success() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest = utf8_temp_dir(&temp).join("lantern-master.zip");
        let mut downloader = MockArchiveDownloader::new();
        downloader.expect_download().returning(|_, _| Ok(()));

        let outcome = fetch(&downloader, "https://example.test/latest.zip", &dest)
            .expect("fetch succeeds");
        assert!(matches!(outcome, FetchOutcome::Downloaded));
    }

    #[test]
    fn connect_failure_with_cached_file_falls_back() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest = utf8_temp_dir(&temp).join("lantern-master.zip");
        std::fs::write(&dest, b"stale archive").expect("seed cache");

        let mut downloader = MockArchiveDownloader::new();
        downloader
            .expect_download()
            .returning(|_, _| Err(connect_error()));

        let outcome = fetch(&downloader, "https://example.test/latest.zip", &dest)
            .expect("fallback succeeds");
        assert!(matches!(outcome, FetchOutcome::StaleCache { .. }));
        assert_eq!(
            std::fs::read(&dest).expect("cached file intact"),
            b"stale archive"
        );
    }

    #[test]
    fn connect_failure_without_cache_propagates() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest = utf8_temp_dir(&temp).join("lantern-master.zip");

        let mut downloader = MockArchiveDownloader::new();
        downloader
            .expect_download()
            .returning(|_, _| Err(connect_error()));

        let err = fetch(&downloader, "https://example.test/latest.zip", &dest)
            .expect_err("no fallback available");
        assert!(matches!(err, DownloadError::Connect { .. }));
    }

    #[test]
    fn http_status_failure_never_falls_back() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest = utf8_temp_dir(&temp).join("lantern-master.zip");
        std::fs::write(&dest, b"stale archive").expect("seed cache");

        let mut downloader = MockArchiveDownloader::new();
        downloader.expect_download().returning(|url, _| {
            Err(DownloadError::Status {
                url: url.to_owned(),
                status: 500,
            })
        });

        let err = fetch(&downloader, "https://example.test/latest.zip", &dest)
            .expect_err("status errors are fatal");
        assert!(matches!(err, DownloadError::Status { status: 500, .. }));
    }
}
