//! Version resolution for Lantern application packages.
//!
//! Maps a requested version token to a concrete download URL. Symbolic
//! tokens resolve statically; release-series tokens consult the GitHub
//! release listing through a trait-based seam, enabling dependency
//! injection for testing.

use crate::archive::download::http_agent;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Endpoint returning the JSON release listing for the framework skeleton.
pub const RELEASE_LISTING_URL: &str =
    "https://api.github.com/repos/lantern-php/lantern/releases";

/// Snapshot archive for the latest stable framework skeleton.
pub const CABINET_LATEST_URL: &str = "https://cabinet.lantern-php.dev/latest.zip";

/// Snapshot archive for the development branch.
pub const CABINET_DEVELOP_URL: &str = "https://cabinet.lantern-php.dev/latest-develop.zip";

/// Snapshot archive bundling the authentication scaffolding.
pub const CABINET_AUTH_URL: &str = "https://cabinet.lantern-php.dev/latest-auth.zip";

/// Every version token the installer recognizes, in display order.
pub const KNOWN_VERSIONS: [&str; 9] = [
    "master", "develop", "auth", "7", "6", "5.8", "5.7", "5.6", "5.5",
];

/// Archive URL for a named release of the framework skeleton.
#[must_use]
pub fn release_archive_url(release: &str) -> String {
    format!("https://github.com/lantern-php/lantern/archive/{release}.zip")
}

/// A recognized version request.
///
/// Tokens outside [`KNOWN_VERSIONS`] fall back to [`VersionToken::Master`];
/// an unrecognized version is a permissive default, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionToken {
    /// Latest stable snapshot.
    Master,
    /// Development branch snapshot.
    Develop,
    /// Authentication scaffolding snapshot.
    Auth,
    /// A release series such as `7` or `5.8`, matched with caret semantics.
    Range(String),
}

impl VersionToken {
    /// Parse a raw version argument into a token.
    ///
    /// # Examples
    ///
    /// ```
    /// use lantern_installer::resolution::VersionToken;
    ///
    /// assert_eq!(VersionToken::parse("develop"), VersionToken::Develop);
    /// assert_eq!(
    ///     VersionToken::parse("5.8"),
    ///     VersionToken::Range("5.8".to_owned())
    /// );
    /// assert_eq!(VersionToken::parse("not-a-version"), VersionToken::Master);
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "master" => Self::Master,
            "develop" => Self::Develop,
            "auth" => Self::Auth,
            other if KNOWN_VERSIONS.contains(&other) => Self::Range(other.to_owned()),
            _ => Self::Master,
        }
    }

    /// The token as it appears in cache filenames and progress output.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Master => "master",
            Self::Develop => "develop",
            Self::Auth => "auth",
            Self::Range(series) => series,
        }
    }
}

impl Default for VersionToken {
    /// The permissive default: the latest stable snapshot.
    fn default() -> Self {
        Self::Master
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors arising from version resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The release listing could not be fetched.
    #[error("release listing request failed: {reason}")]
    Listing {
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The release listing body was not valid JSON.
    #[error("release listing could not be parsed: {0}")]
    ListingFormat(#[from] serde_json::Error),

    /// No release satisfies the requested series.
    #[error("unable to find release version {token}")]
    VersionNotFound {
        /// The series token that matched nothing.
        token: String,
    },
}

/// Trait for fetching the release name listing.
///
/// Abstraction allows tests to resolve range tokens without network access.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseLister {
    /// Return the names of all published releases, in listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched or parsed.
    fn list_releases(&self) -> Result<Vec<String>, ResolveError>;
}

/// One entry of the GitHub release listing; only the name is consumed.
#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    /// Release name, e.g. `v7.2.0`. May be null on draft releases.
    name: Option<String>,
}

/// HTTP-based release lister using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpReleaseLister;

impl ReleaseLister for HttpReleaseLister {
    fn list_releases(&self) -> Result<Vec<String>, ResolveError> {
        let response = http_agent()
            .get(RELEASE_LISTING_URL)
            .call()
            .map_err(|e| ResolveError::Listing {
                reason: e.to_string(),
            })?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| ResolveError::Listing {
                reason: e.to_string(),
            })?;
        let entries: Vec<ReleaseEntry> = serde_json::from_str(&body)?;
        Ok(entries.into_iter().filter_map(|entry| entry.name).collect())
    }
}

/// Resolve a version token to its download URL.
///
/// Symbolic tokens map statically without touching the network. Range
/// tokens fetch the release listing and select the highest release whose
/// version satisfies the series with caret semantics (`5.8` means `^5.8`).
///
/// # Errors
///
/// Returns [`ResolveError::VersionNotFound`] when no release satisfies a
/// range token, or a listing error when the release listing is unavailable.
pub fn resolve(token: &VersionToken, lister: &dyn ReleaseLister) -> Result<String, ResolveError> {
    match token {
        VersionToken::Master => Ok(CABINET_LATEST_URL.to_owned()),
        VersionToken::Develop => Ok(CABINET_DEVELOP_URL.to_owned()),
        VersionToken::Auth => Ok(CABINET_AUTH_URL.to_owned()),
        VersionToken::Range(series) => resolve_range(series, lister),
    }
}

/// Select the highest release satisfying the series and build its URL.
fn resolve_range(series: &str, lister: &dyn ReleaseLister) -> Result<String, ResolveError> {
    let requirement =
        semver::VersionReq::parse(series).map_err(|_| ResolveError::VersionNotFound {
            token: series.to_owned(),
        })?;

    let mut best: Option<(semver::Version, String)> = None;
    for name in lister.list_releases()? {
        let Some(version) = parse_release_version(&name) else {
            log::debug!("skipping unparseable release name {name:?}");
            continue;
        };
        if !requirement.matches(&version) {
            continue;
        }
        let is_higher = best
            .as_ref()
            .is_none_or(|(current, _)| version > *current);
        if is_higher {
            best = Some((version, name));
        }
    }

    best.map(|(_, name)| release_archive_url(&name))
        .ok_or_else(|| ResolveError::VersionNotFound {
            token: series.to_owned(),
        })
}

/// Parse a release name such as `v7.2.0` into a comparable version.
fn parse_release_version(name: &str) -> Option<semver::Version> {
    let trimmed = name.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    semver::Version::parse(bare).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// A lister whose listing is always unavailable; symbolic tokens must
    /// resolve without ever consulting it.
    struct UnreachableLister;

    impl ReleaseLister for UnreachableLister {
        fn list_releases(&self) -> Result<Vec<String>, ResolveError> {
            Err(ResolveError::Listing {
                reason: "no network in tests".to_owned(),
            })
        }
    }

    /// A lister backed by a fixed set of release names.
    struct FixedLister(Vec<&'static str>);

    impl ReleaseLister for FixedLister {
        fn list_releases(&self) -> Result<Vec<String>, ResolveError> {
            Ok(self.0.iter().map(|s| (*s).to_owned()).collect())
        }
    }

    #[rstest]
    #[case::master("master", VersionToken::Master)]
    #[case::develop("develop", VersionToken::Develop)]
    #[case::auth("auth", VersionToken::Auth)]
    #[case::major_series("7", VersionToken::Range("7".to_owned()))]
    #[case::minor_series("5.8", VersionToken::Range("5.8".to_owned()))]
    #[case::unknown_falls_back("next", VersionToken::Master)]
    #[case::unlisted_series_falls_back("4.2", VersionToken::Master)]
    fn parse_recognizes_known_tokens(#[case] raw: &str, #[case] expected: VersionToken) {
        assert_eq!(VersionToken::parse(raw), expected);
    }

    #[rstest]
    #[case::master(VersionToken::Master, CABINET_LATEST_URL)]
    #[case::develop(VersionToken::Develop, CABINET_DEVELOP_URL)]
    #[case::auth(VersionToken::Auth, CABINET_AUTH_URL)]
    fn symbolic_tokens_resolve_without_listing(
        #[case] token: VersionToken,
        #[case] expected: &str,
    ) {
        let url = resolve(&token, &UnreachableLister).expect("static resolution");
        assert_eq!(url, expected);
    }

    #[test]
    fn range_picks_highest_matching_release() {
        let lister = FixedLister(vec!["v5.8.3", "v5.8.17", "v6.0.0", "v5.8.9"]);
        let token = VersionToken::parse("5.8");
        let url = resolve(&token, &lister).expect("resolution");
        assert_eq!(url, release_archive_url("v5.8.17"));
    }

    #[test]
    fn major_series_matches_caret_range() {
        let lister = FixedLister(vec!["v6.20.0", "v7.0.0", "v7.2.1", "v8.0.0"]);
        let token = VersionToken::parse("7");
        let url = resolve(&token, &lister).expect("resolution");
        assert_eq!(url, release_archive_url("v7.2.1"));
    }

    #[test]
    fn unparseable_release_names_are_skipped() {
        let lister = FixedLister(vec!["Weekly build", "v7.0.3", ""]);
        let token = VersionToken::parse("7");
        let url = resolve(&token, &lister).expect("resolution");
        assert_eq!(url, release_archive_url("v7.0.3"));
    }

    #[test]
    fn range_with_no_match_fails() {
        let lister = FixedLister(vec!["v6.0.0", "v7.0.0"]);
        let token = VersionToken::parse("5.8");
        let err = resolve(&token, &lister).expect_err("no matching release");
        assert!(matches!(
            err,
            ResolveError::VersionNotFound { token } if token == "5.8"
        ));
    }

    #[test]
    fn listing_failure_propagates_for_ranges() {
        let token = VersionToken::parse("7");
        let err = resolve(&token, &UnreachableLister).expect_err("listing unavailable");
        assert!(matches!(err, ResolveError::Listing { .. }));
    }

    #[test]
    fn listing_entries_without_names_are_dropped() {
        let body = r#"[{"name": "v7.1.0"}, {"name": null}, {"tag_name": "v9"}]"#;
        let entries: Vec<ReleaseEntry> = serde_json::from_str(body).expect("parse");
        let names: Vec<String> = entries.into_iter().filter_map(|e| e.name).collect();
        assert_eq!(names, vec!["v7.1.0".to_owned()]);
    }
}
