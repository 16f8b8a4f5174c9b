//! Error types for the runner

use thiserror::Error;

/// Errors raised while starting or waiting on a child process
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Process execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Execution timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}
