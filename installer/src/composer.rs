//! Composer discovery and setup-chain execution.
//!
//! After materialization the new application still needs its dependencies
//! installed and its lifecycle scripts run. That work happens in one shell
//! invocation chaining four Composer sub-commands with `&&`, so the chain
//! stops at the first failure.

use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};

/// The Composer sub-commands run after scaffolding, in order.
pub const SETUP_STEPS: [&str; 4] = [
    "install --no-scripts",
    "run-script post-root-package-install",
    "run-script post-create-project-cmd",
    "run-script post-autoload-dump",
];

/// Options forwarded to every Composer sub-command.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupOptions {
    /// Append `--no-ansi` to every sub-command.
    pub no_ansi: bool,
    /// Append `--quiet` to every sub-command.
    pub quiet: bool,
}

/// Locate the Composer executable for the environment.
///
/// A `composer.phar` in the working directory is preferred, run through
/// `php`; otherwise the `composer` binary on `PATH` is used.
#[must_use]
pub fn find_composer(working_dir: &Utf8Path) -> String {
    let phar = working_dir.join("composer.phar");
    if phar.as_std_path().is_file() {
        format!("php \"{phar}\"")
    } else {
        "composer".to_owned()
    }
}

/// Build the `&&`-joined setup chain for the given Composer invocation.
#[must_use]
pub fn setup_command(composer: &str, options: SetupOptions) -> String {
    SETUP_STEPS
        .iter()
        .map(|step| {
            let mut command = format!("{composer} {step}");
            if options.no_ansi {
                command.push_str(" --no-ansi");
            }
            if options.quiet {
                command.push_str(" --quiet");
            }
            command
        })
        .collect::<Vec<_>>()
        .join(" && ")
}

/// Trait for running a shell command chain, enabling test stubbing.
pub trait ProcessRunner {
    /// Run `command` through the shell in `working_dir`, forwarding its
    /// output live, and return the exit code.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning or streaming the
    /// process. A non-zero exit is reported through the return code, not
    /// as an error.
    fn run_shell(
        &self,
        command: &str,
        working_dir: &Utf8Path,
        output: &mut dyn Write,
    ) -> Result<i32>;
}

/// Executes command chains on the host system via `sh -c`.
///
/// When the controlling terminal is openable the child borrows it for
/// stdin and inherits stdout/stderr, preserving interactive progress
/// output. Without a terminal the child's stdout is forwarded to the
/// output sink by a single blocking read loop and stderr stays inherited.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run_shell(
        &self,
        command: &str,
        working_dir: &Utf8Path,
        output: &mut dyn Write,
    ) -> Result<i32> {
        let mut shell = Command::new("sh");
        shell.arg("-c").arg(command).current_dir(working_dir.as_std_path());

        if let Some(tty) = controlling_terminal() {
            shell.stdin(tty);
            let status = shell.status().map_err(InstallerError::Io)?;
            return Ok(exit_code(status));
        }

        shell.stdin(Stdio::null()).stdout(Stdio::piped());
        let mut child = shell.spawn().map_err(InstallerError::Io)?;
        if let Some(mut stdout) = child.stdout.take() {
            forward_stream(&mut stdout, output)?;
        }
        let status = child.wait().map_err(InstallerError::Io)?;
        Ok(exit_code(status))
    }
}

/// Copy a child stream to the output sink as bytes arrive.
fn forward_stream(stream: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
    let mut buffer = [0u8; 8192];
    loop {
        let read = stream.read(&mut buffer).map_err(InstallerError::Io)?;
        if read == 0 {
            return Ok(());
        }
        let chunk = buffer.get(..read).unwrap_or_default();
        output.write_all(chunk).map_err(InstallerError::Io)?;
        let _ = output.flush();
    }
}

/// Exit code of a finished process; signal terminations count as failure.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Open the controlling terminal for handing to a child process.
#[cfg(unix)]
fn controlling_terminal() -> Option<Stdio> {
    std::fs::File::open("/dev/tty").ok().map(Stdio::from)
}

#[cfg(not(unix))]
fn controlling_terminal() -> Option<Stdio> {
    None
}
