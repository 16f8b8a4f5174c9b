use crate::error::RunnerError;
use std::io::Read;
use std::process::{Child, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use super::{CommandSpec, ProcessOutput, ProcessRunner};

/// Interval between `try_wait` polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to keep draining pipes after the child has exited or been killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Native process runner built on `std::process::Command`.
///
/// The child is polled with `try_wait` against the deadline while two reader
/// threads drain stdout and stderr. Completion is decided by the direct child
/// exiting, not by the pipes closing, so a shell that leaves a background job
/// behind still reports its own exit code. On Unix the child runs in its own
/// process group, which is killed once the shell exits or the deadline passes.
///
/// # Example
///
/// ```rust,no_run
/// use pipeforge_runner::{CommandSpec, NativeRunner, ProcessRunner};
/// use std::time::Duration;
///
/// let runner = NativeRunner::new();
/// let output = runner
///     .run(&CommandSpec::new("echo").arg("hello"), Duration::from_secs(30))
///     .unwrap();
/// assert!(output.success());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRunner;

impl NativeRunner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Kill whatever is left of the process group led by `pid`.
    #[cfg(unix)]
    fn kill_group(pid: u32) {
        // Negative pid targets the process group created at spawn.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    fn kill_group(_pid: u32) {}

    /// Kill the child and its group, then reap it.
    fn terminate(child: &mut Child) {
        Self::kill_group(child.id());
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Drain `source` on a helper thread, forwarding chunks as they arrive.
fn spawn_reader<S>(source: Option<S>) -> Receiver<Vec<u8>>
where
    S: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    if let Some(mut source) = source {
        thread::spawn(move || {
            let mut buf = [0u8; 8192];
            loop {
                match source.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
    rx
}

/// Collect chunks until the reader finishes or `deadline` passes.
fn collect(rx: &Receiver<Vec<u8>>, deadline: Instant) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(chunk) => out.extend_from_slice(&chunk),
            Err(_) => break,
        }
    }
    out
}

impl ProcessRunner for NativeRunner {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError> {
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let started = Instant::now();
        let mut child = command.spawn().map_err(|e| RunnerError::SpawnFailed {
            program: cmd.program.to_string_lossy().into_owned(),
            reason: e.to_string(),
        })?;

        let stdout_rx = spawn_reader(child.stdout.take());
        let stderr_rx = spawn_reader(child.stderr.take());
        let deadline = started + timeout;

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    tracing::warn!(
                        command = %cmd.display(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Command timed out, killing process"
                    );
                    Self::terminate(&mut child);
                    return Err(RunnerError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    Self::terminate(&mut child);
                    return Err(RunnerError::ExecutionFailed {
                        reason: format!("Failed to wait for process: {e}"),
                    });
                }
            }
        };
        let duration = started.elapsed();

        // Background jobs may still hold the pipes open.
        Self::kill_group(child.id());
        let drain_deadline = Instant::now() + DRAIN_GRACE;
        let stdout = collect(&stdout_rx, drain_deadline);
        let stderr = collect(&stderr_rx, drain_deadline);

        Ok(ProcessOutput::new(stdout, stderr, status.code(), duration))
    }
}


#[cfg(all(test, windows))]
mod windows_tests {
    use super::*;

    #[test]
    fn test_native_runner_times_out_without_process_groups() {
        let runner = NativeRunner::new();
        let cmd = CommandSpec::shell("ping -n 30 127.0.0.1 > NUL");
        let started = Instant::now();
        let result = runner.run(&cmd, Duration::from_millis(300));

        assert!(matches!(result, Err(RunnerError::Timeout { timeout_ms: 300 })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
