//! Application package handling: download, validation, materialization.
//!
//! An application package is a zip archive of the framework skeleton. The
//! submodules cover its lifecycle: [`download`] fetches it into the cache
//! (with a stale-cache fallback on connection failures), [`extraction`]
//! validates and unpacks it, and [`materialize`] relocates the unpacked
//! tree into the destination directory.

pub mod download;
pub mod extraction;
pub mod materialize;
