//! `G_COMMANDS`: run the DoD's verification commands.
//!
//! Every command runs, in order, through the platform shell with the project
//! as working directory. A failure never stops the remaining commands.

use camino::Utf8Path;
use serde_json::json;
use std::time::{Duration, Instant};

use pipeforge_runner::{CommandSpec, ProcessRunner, RunnerError};

use crate::types::{CommandResult, GateId, GateResult};

/// Exit code recorded for a command killed by the timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code recorded for a command that could not be started
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Captured output kept per stream; older output is dropped.
pub const MAX_CAPTURED_BYTES: usize = 64 * 1024;

/// Run one shell command and record its outcome. Never fails.
pub fn run_command<R: ProcessRunner>(
    runner: &R,
    project: &Utf8Path,
    command: &str,
    timeout: Duration,
) -> CommandResult {
    let spec = CommandSpec::shell(command).cwd(project.as_std_path());
    let started = Instant::now();

    let result = match runner.run(&spec, timeout) {
        Ok(output) => {
            let exit_code = output.exit_code.unwrap_or(-1);
            CommandResult {
                cmd: command.to_string(),
                exit_code,
                stdout: tail(&output.stdout_string()),
                stderr: tail(&output.stderr_string()),
                duration_ms: millis(output.duration),
                success: output.success(),
                timed_out: false,
            }
        }
        Err(RunnerError::Timeout { timeout_ms }) => CommandResult {
            cmd: command.to_string(),
            exit_code: TIMEOUT_EXIT_CODE,
            stdout: String::new(),
            stderr: format!("command timed out after {}", describe_timeout(timeout_ms)),
            duration_ms: millis(started.elapsed()),
            success: false,
            timed_out: true,
        },
        Err(e) => CommandResult {
            cmd: command.to_string(),
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: e.to_string(),
            duration_ms: millis(started.elapsed()),
            success: false,
            timed_out: false,
        },
    };

    tracing::info!(
        gate = GateId::Commands.as_str(),
        cmd = %result.cmd,
        exit_code = result.exit_code,
        duration_ms = result.duration_ms,
        "verification command finished"
    );
    result
}

/// Run all `commands` and build the gate result.
pub fn check_commands<R: ProcessRunner>(
    runner: &R,
    project: &Utf8Path,
    commands: &[String],
    timeout: Duration,
) -> (GateResult, Vec<CommandResult>) {
    let results: Vec<CommandResult> = commands
        .iter()
        .map(|command| run_command(runner, project, command, timeout))
        .collect();

    (commands_gate(&results), results)
}

/// Gate result for fast mode, where no command is executed.
#[must_use]
pub fn skipped_gate() -> GateResult {
    GateResult::new(GateId::Commands, true, "Skipped (fast mode)")
        .with_details(json!({ "skipped": true }))
}

fn commands_gate(results: &[CommandResult]) -> GateResult {
    if results.is_empty() {
        return GateResult::new(GateId::Commands, true, "No verification commands declared");
    }

    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.cmd.as_str())
        .collect();

    if failed.is_empty() {
        GateResult::new(
            GateId::Commands,
            true,
            format!("All {} commands succeeded", results.len()),
        )
    } else {
        GateResult::new(
            GateId::Commands,
            false,
            format!("{} of {} commands failed", failed.len(), results.len()),
        )
        .with_details(json!({ "failed": failed }))
    }
}

/// Whole seconds as `60s`, anything finer as `250ms`.
fn describe_timeout(timeout_ms: u64) -> String {
    if timeout_ms % 1000 == 0 {
        format!("{}s", timeout_ms / 1000)
    } else {
        format!("{timeout_ms}ms")
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Keep the last [`MAX_CAPTURED_BYTES`] of `text`, on a char boundary.
fn tail(text: &str) -> String {
    if text.len() <= MAX_CAPTURED_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - MAX_CAPTURED_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("[... truncated ...]\n{}", &text[start..])
}
