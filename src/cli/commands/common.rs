//! Helpers shared by the command handlers

use anyhow::Result;
use camino::Utf8PathBuf;
use std::path::PathBuf;

use pipeforge_artifact::ArtifactStore;
use pipeforge_config::Config;
use pipeforge_gate::{GateStatus, VerificationReport};
use pipeforge_utils::error::{ConfigError, PipeforgeError, RunError};
use pipeforge_utils::run_id::validate_run_id;
use pipeforge_utils::types::Phase;

/// The run id from `--run-id`/`RUN_ID`, validated.
pub fn require_run_id(run_id: Option<String>) -> Result<String, PipeforgeError> {
    let run_id = run_id.ok_or(RunError::Missing)?;
    validate_run_id(&run_id)?;
    Ok(run_id)
}

pub fn artifact_store(config: &Config) -> ArtifactStore {
    ArtifactStore::new(config.runs_root())
}

/// Resolve a user-supplied project path, defaulting to the run's
/// implementation directory.
pub fn resolve_project(
    store: &ArtifactStore,
    run_id: &str,
    path: Option<PathBuf>,
) -> Result<Utf8PathBuf, PipeforgeError> {
    match path {
        Some(path) => Utf8PathBuf::from_path_buf(path).map_err(|p| {
            PipeforgeError::from(ConfigError::InvalidValue {
                key: "path".to_string(),
                value: format!("{} is not valid UTF-8", p.display()),
            })
        }),
        None => Ok(store.phase_dir(run_id, Phase::Implementation)),
    }
}

pub fn status_mark(status: GateStatus) -> &'static str {
    if status.is_pass() { "✓" } else { "✗" }
}

/// Gate lines as printed by `verify` and `status`.
pub fn print_gate_lines(report: &VerificationReport) {
    for gate in report.ordered_gates() {
        println!("  {} {}: {}", status_mark(gate.status), gate.id, gate.message);
    }
}
