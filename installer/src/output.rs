//! User-facing message formatting for the installer CLI.
//!
//! All progress and status text flows through an injected [`Write`] sink so
//! tests can capture it; formatting lives here to keep the orchestration
//! modules free of string assembly.

use crate::resolution::KNOWN_VERSIONS;
use std::io::Write;

/// Write one line to the given sink, swallowing write failures.
pub fn write_line(sink: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(sink, "{message}").is_err() {
        // Best-effort output; a closed pipe must not abort the run.
    }
}

/// Banner printed when scaffolding starts.
#[must_use]
pub const fn crafting_message() -> &'static str {
    "Crafting a new Lantern application..."
}

/// Final message printed after a successful setup chain.
#[must_use]
pub const fn ready_message() -> &'static str {
    "Application ready. Build something brilliant."
}

/// Warning printed when the download failed but a cached archive exists.
#[must_use]
pub const fn cached_fallback_message() -> &'static str {
    "Attempting to use cached package..."
}

/// Warning printed when the writable-directory adjustment fails.
#[must_use]
pub const fn writable_dirs_warning() -> &'static str {
    "You should verify that the \"storage\" and \"bootstrap/cache\" directories are writable."
}

/// Listing of the known version tokens, in display order.
#[must_use]
pub fn versions_listing() -> String {
    format!(
        "Available Lantern versions:\n  {}",
        KNOWN_VERSIONS.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_line_appends_newline() {
        let mut sink = Vec::new();
        write_line(&mut sink, "hello");
        assert_eq!(sink, b"hello\n");
    }

    #[test]
    fn versions_listing_names_every_token() {
        let listing = versions_listing();
        for token in KNOWN_VERSIONS {
            assert!(listing.contains(token), "missing token {token}");
        }
    }

    #[test]
    fn versions_listing_keeps_display_order() {
        let listing = versions_listing();
        let master = listing.find("master").expect("master listed");
        let develop = listing.find("develop").expect("develop listed");
        assert!(master < develop);
    }
}
