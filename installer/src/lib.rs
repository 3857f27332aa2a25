//! Lantern installer library.
//!
//! This crate provides the core functionality for scaffolding new Lantern
//! applications: resolving a requested version to a download URL, fetching
//! the application package into a local cache, materializing the archive
//! into the destination directory, and handing over to Composer for
//! dependency installation. It is used by the `lantern` CLI binary and can
//! be consumed programmatically for testing or custom scaffolding workflows.
//!
//! # Modules
//!
//! - [`archive`] - Package download, validation, and materialization
//! - [`cache`] - Local archive cache rooted beside the executable
//! - [`cli`] - Command-line argument definitions
//! - [`composer`] - Composer discovery and setup-chain execution
//! - [`error`] - Semantic error types with recovery hints
//! - [`fsops`] - Explicit recursive filesystem tree operations
//! - [`output`] - User-facing message formatting
//! - [`resolution`] - Version token parsing and release resolution
//! - [`scaffold`] - Orchestration of the `new` command flow

pub mod archive;
pub mod cache;
pub mod cli;
pub mod composer;
pub mod error;
pub mod fsops;
pub mod output;
pub mod resolution;
pub mod scaffold;
