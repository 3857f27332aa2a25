//! CLI argument definitions for the Lantern installer.
//!
//! This module defines the command-line interface using clap. It is
//! separated from the main entrypoint to keep the binary small and focused
//! on orchestration.

use crate::resolution::VersionToken;
use clap::{Args, Parser, Subcommand};

/// Scaffold and manage Lantern applications.
#[derive(Parser, Debug)]
#[command(name = "lantern")]
#[command(version, about)]
#[command(long_about = concat!(
    "Scaffold new Lantern applications.\n\n",
    "The installer downloads a zip archive of the framework skeleton for the ",
    "requested version, extracts it into the target directory, and runs the ",
    "Composer setup chain to install dependencies and fire the lifecycle ",
    "scripts.\n\n",
    "Downloaded archives are kept in a local cache so repeated installs of ",
    "the same version avoid the network, and installs keep working from the ",
    "cache when the package host is unreachable.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Create an application in ./blog from the latest stable snapshot:\n",
    "    $ lantern new blog\n\n",
    "  Create an application pinned to the 5.8 release series:\n",
    "    $ lantern new blog 5.8\n\n",
    "  Create an application with the authentication scaffolding:\n",
    "    $ lantern new blog --auth\n\n",
    "  Pre-download every known version into the cache:\n",
    "    $ lantern cache --all\n\n",
    "  Clear the cache:\n",
    "    $ lantern cache:clear\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a new Lantern application.
    New(NewArgs),

    /// Download application packages into the local cache.
    Cache(CacheArgs),

    /// Remove every archive from the local cache.
    #[command(name = "cache:clear")]
    CacheClear,

    /// Show the available version tokens.
    Versions,
}

/// Arguments for the `new` command.
#[derive(Args, Debug, Clone, Default)]
pub struct NewArgs {
    /// Directory name for the new application [default: current directory].
    pub name: Option<String>,

    /// Version to install (symbolic name or release series).
    pub version: Option<String>,

    /// Install the latest development snapshot.
    #[arg(long, conflicts_with = "auth")]
    pub dev: bool,

    /// Install the authentication scaffolding snapshot.
    #[arg(long)]
    pub auth: bool,

    /// Install even if the directory already exists.
    #[arg(short, long)]
    pub force: bool,

    /// Disable ANSI output from the dependency manager.
    #[arg(long)]
    pub no_ansi: bool,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Show per-step progress detail.
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,
}

impl NewArgs {
    /// The version token this invocation asks for.
    ///
    /// `--dev` and `--auth` take precedence over the positional version;
    /// with neither flag nor argument the latest stable snapshot is used.
    ///
    /// # Examples
    ///
    /// ```
    /// use lantern_installer::cli::NewArgs;
    /// use lantern_installer::resolution::VersionToken;
    ///
    /// let args = NewArgs {
    ///     dev: true,
    ///     ..NewArgs::default()
    /// };
    /// assert_eq!(args.version_token(), VersionToken::Develop);
    ///
    /// assert_eq!(NewArgs::default().version_token(), VersionToken::Master);
    /// ```
    #[must_use]
    pub fn version_token(&self) -> VersionToken {
        if self.dev {
            VersionToken::Develop
        } else if self.auth {
            VersionToken::Auth
        } else {
            VersionToken::parse(self.version.as_deref().unwrap_or("master"))
        }
    }
}

/// Arguments for the `cache` command.
#[derive(Args, Debug, Clone, Default)]
pub struct CacheArgs {
    /// Versions to download [default: master].
    pub versions: Vec<String>,

    /// Download every known version.
    #[arg(short, long, conflicts_with = "versions")]
    pub all: bool,

    /// Clear the cache before downloading.
    #[arg(long)]
    pub clean: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
