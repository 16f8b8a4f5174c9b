//! Loop command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;

use pipeforge_config::Config;
use pipeforge_engine::{LoopController, LoopOptions};
use pipeforge_fixup::FixSession;
use pipeforge_gate::Verifier;
use pipeforge_utils::canonicalization::emit_jcs;
use pipeforge_utils::exit_codes::ExitCode;
use pipeforge_utils::logging::command_span;

use super::common::{artifact_store, require_run_id, resolve_project, status_mark};

/// Run the verify/fix loop; exit 0 on PASS and 1 when attempts run out.
pub fn execute_loop_command(
    run_id: Option<String>,
    path: Option<PathBuf>,
    fast: bool,
    json: bool,
    config: &Config,
) -> Result<ExitCode> {
    let run_id = require_run_id(run_id)?;
    let _guard = command_span(&run_id, "loop").entered();

    let store = artifact_store(config);
    let project = resolve_project(&store, &run_id, path)?;
    let options = LoopOptions {
        max_attempts: config.max_loop_attempts(),
        project_path: Some(project),
        fast,
    };

    let verifier = Verifier::new(store.clone(), config.command_timeout());
    let fixer = FixSession::new(
        store.clone(),
        config.package_manager(),
        config.command_timeout(),
    );
    let mut controller = LoopController::new(store, verifier, fixer);
    let summary = controller.run(&run_id, &options)?;

    if json {
        println!("{}", emit_jcs(&summary).context("Failed to emit loop JSON")?);
    } else {
        for attempt in &summary.attempts {
            println!(
                "  {} attempt {}/{}: {}",
                status_mark(attempt.status),
                attempt.attempt,
                summary.max_attempts,
                attempt.status
            );
        }
        if summary.passed() {
            println!("✓ Loop passed after {} attempt(s)", summary.attempts_used);
        } else if summary.halted_by_ceiling {
            println!("✗ Loop stopped: AutoFix ceiling reached; human decision required");
        } else {
            println!("✗ Loop failed after {} attempt(s)", summary.attempts_used);
        }
        println!("  Summary: 70_fix/loop_summary.md");
    }

    Ok(if summary.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
