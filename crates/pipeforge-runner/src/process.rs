use crate::error::RunnerError;
use std::time::Duration;

use super::CommandSpec;

/// Output from a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Standard output from the process
    pub stdout: Vec<u8>,
    /// Standard error from the process
    pub stderr: Vec<u8>,
    /// Exit code from the process (None if terminated by signal)
    pub exit_code: Option<i32>,
    /// Wall-clock duration of the process
    pub duration: Duration,
}

impl ProcessOutput {
    #[must_use]
    pub fn new(
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        exit_code: Option<i32>,
        duration: Duration,
    ) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            duration,
        }
    }

    /// Get stdout as a UTF-8 string, lossy conversion.
    #[must_use]
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a UTF-8 string, lossy conversion.
    #[must_use]
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Check if the process exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for synchronous process execution.
///
/// The Verifier and the Fixer only ever talk to this trait, so tests can
/// substitute scripted runners for real processes.
///
/// # Example
///
/// ```rust
/// use pipeforge_runner::{CommandSpec, ProcessOutput, ProcessRunner, RunnerError};
/// use std::time::Duration;
///
/// struct EchoRunner;
///
/// impl ProcessRunner for EchoRunner {
///     fn run(&self, cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, RunnerError> {
///         Ok(ProcessOutput::new(cmd.display().into_bytes(), Vec::new(), Some(0), Duration::ZERO))
///     }
/// }
///
/// let out = EchoRunner.run(&CommandSpec::new("true"), Duration::from_secs(1)).unwrap();
/// assert!(out.success());
/// ```
pub trait ProcessRunner {
    /// Execute a command, waiting at most `timeout`.
    ///
    /// * `Ok(ProcessOutput)` - the process finished (possibly with a non-zero exit code)
    /// * `Err(RunnerError::Timeout)` - the process was killed after `timeout`
    /// * `Err(RunnerError::SpawnFailed)` - the program could not be started
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError> {
        (**self).run(cmd, timeout)
    }
}
