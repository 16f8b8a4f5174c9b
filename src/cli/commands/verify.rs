//! Verify command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;

use pipeforge_config::Config;
use pipeforge_gate::json::emit_report_json;
use pipeforge_gate::{Verifier, VerifyOptions};
use pipeforge_utils::exit_codes::ExitCode;
use pipeforge_utils::logging::command_span;

use super::common::{artifact_store, print_gate_lines, require_run_id, resolve_project};

/// Run the gates; exit 0 on PASS and 1 on FAIL.
pub fn execute_verify_command(
    run_id: Option<String>,
    path: Option<PathBuf>,
    fast: bool,
    json: bool,
    config: &Config,
) -> Result<ExitCode> {
    let run_id = require_run_id(run_id)?;
    let _guard = command_span(&run_id, "verify").entered();

    let store = artifact_store(config);
    let project = resolve_project(&store, &run_id, path)?;
    let verifier = Verifier::new(store, config.command_timeout());
    let report = verifier.verify(&run_id, &project, VerifyOptions { fast, json })?;

    if json {
        println!(
            "{}",
            emit_report_json(&report).context("Failed to emit verification JSON")?
        );
    } else {
        println!("Verification {} for run {run_id}", report.status);
        print_gate_lines(&report);
        for violation in &report.violations {
            println!("    - {}: {}", violation.rule, violation.detail);
        }
        for command in report.commands.iter().filter(|c| !c.success) {
            println!("    - `{}` exited with {}", command.cmd, command.exit_code);
        }
        println!(
            "\n  Next: {}",
            if report.status.is_pass() {
                "deploy"
            } else {
                "pipeforge fix"
            }
        );
    }

    Ok(if report.status.is_pass() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
