//! Generic external command execution.
//!
//! The production implementation uses tokio; test doubles can return canned
//! results without spawning processes. Every call allocates its own output
//! buffers — invocations that run concurrently (the polling loop racing the
//! signal-triggered stop) must never share captured output.

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};

/// Abstracts process execution so the toolchain can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a resolved executable and capture its output.
    ///
    /// A non-zero exit is an `Ok` result with `status.success() == false`;
    /// only a failure to spawn the process is an `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    async fn run(&self, program: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output>;
}

/// Production `CommandRunner` — shells out via [`tokio::process::Command`].
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
        tokio::process::Command::new(program)
            .args(args)
            .envs(envs.iter().copied())
            .output()
            .await
            .with_context(|| format!("failed to run {}", program.display()))
    }
}

/// Lossy text view of captured stdout.
#[must_use]
pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Lossy text view of captured stderr.
#[must_use]
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Build the error for a command that ran but exited non-zero, carrying the
/// captured output for diagnostics.
#[must_use]
pub fn command_failed(what: &str, output: &Output) -> anyhow::Error {
    anyhow::anyhow!(
        "{what} failed ({}).\nstdout: {}\nstderr: {}",
        output.status,
        stdout_text(output).trim_end(),
        stderr_text(output).trim_end(),
    )
}
