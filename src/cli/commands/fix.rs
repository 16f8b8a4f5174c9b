//! Fix command implementation
//!
//! Exits 0 whenever the command completes, whether or not anything could be
//! fixed; only runtime errors produce a non-zero code.

use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;

use pipeforge_config::Config;
use pipeforge_fixup::{FixOptions, FixReport, FixSession, FixStatus};
use pipeforge_gate::{Verifier, VerifyOptions};
use pipeforge_utils::canonicalization::emit_jcs;
use pipeforge_utils::exit_codes::ExitCode;
use pipeforge_utils::logging::command_span;

use super::common::{artifact_store, print_gate_lines, require_run_id, resolve_project};

#[allow(clippy::too_many_arguments)]
pub fn execute_fix_command(
    run_id: Option<String>,
    attempt_num: Option<u32>,
    project_path: Option<PathBuf>,
    approve_change: bool,
    dry_run: bool,
    rerun_qa: bool,
    json: bool,
    config: &Config,
) -> Result<ExitCode> {
    let run_id = require_run_id(run_id)?;
    let _guard = command_span(&run_id, "fix").entered();

    let store = artifact_store(config);
    let session = FixSession::new(
        store.clone(),
        config.package_manager(),
        config.command_timeout(),
    );

    if approve_change {
        let state = session.approve_change(&run_id)?;
        if json {
            let output = json!({ "runId": run_id, "specVersion": state.spec_version });
            println!("{}", emit_jcs(&output).context("Failed to emit fix JSON")?);
        } else {
            println!("✓ Spec change approved; spec version is now {}", state.spec_version);
            println!("  AutoFix attempts reset for run {run_id}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let project = resolve_project(&store, &run_id, project_path)?;
    let options = FixOptions {
        attempt_num,
        project_path: Some(project.clone()),
        approve_change,
        dry_run,
        rerun_qa,
    };
    let report = session.run(&run_id, &options)?;

    if json {
        println!("{}", emit_jcs(&report).context("Failed to emit fix JSON")?);
    } else {
        print_fix_report(&report);
    }

    if rerun_qa && report.status == FixStatus::Attempted {
        let verifier = Verifier::new(store, config.command_timeout());
        let verification = verifier.verify(&run_id, &project, VerifyOptions::default())?;
        tracing::info!(status = %verification.status, "re-verification finished");
        if !json {
            println!("\nRe-verification {}", verification.status);
            print_gate_lines(&verification);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_fix_report(report: &FixReport) {
    match report.status {
        FixStatus::NothingToFix => {
            println!("✓ Nothing to fix for run {}", report.run_id);
            return;
        }
        FixStatus::Halted => {
            println!(
                "✗ AutoFix halted: the same failure pattern was already attempted {} times",
                pipeforge_fixup::MAX_ATTEMPTS
            );
            println!("  Human decision required; see 70_fix/attempt_{}/fix_summary.md", report.attempt);
            println!("  Approve a spec change with: pipeforge fix --run-id {} --approve-change", report.run_id);
            return;
        }
        FixStatus::DryRun => println!("Dry run for attempt {} (nothing changed)", report.attempt),
        FixStatus::Attempted => println!("Fix attempt {}", report.attempt),
    }

    if let Some(decision) = &report.decision {
        println!(
            "  Decision: {} ({} attempts remaining)",
            decision.reason.as_str(),
            decision.attempts_remaining
        );
    }
    for fix in &report.outcome.applied {
        let mark = if fix.success { "✓" } else { "✗" };
        println!("  {mark} {}: {}", fix.check, fix.action);
    }
    for manual in &report.outcome.manual {
        println!("  • {} [{}]", manual.check, manual.category);
        for step in &manual.steps {
            println!("      - {step}");
        }
    }
    println!(
        "\n  Details: 70_fix/attempt_{}/fix_summary.md",
        report.attempt
    );
}
