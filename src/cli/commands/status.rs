//! Status command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use pipeforge_config::Config;
use pipeforge_engine::{LOOP_SUMMARY_JSON, LoopSummary};
use pipeforge_fixup::AutoFixState;
use pipeforge_gate::{GateStatus, REPORT_JSON, VerificationReport};
use pipeforge_utils::canonicalization::emit_jcs;
use pipeforge_utils::exit_codes::ExitCode;
use pipeforge_utils::types::Phase;

use super::common::{artifact_store, print_gate_lines, require_run_id};

const CONFIG_KEYS: [&str; 5] = [
    "runs_dir",
    "command_timeout_secs",
    "max_loop_attempts",
    "package_manager",
    "verbose",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput {
    run_id: String,
    verification: Option<GateStatus>,
    gates: BTreeMap<String, GateStatus>,
    spec_version: u32,
    attempt_in_spec: u32,
    last_failure_fingerprint: Option<String>,
    history_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_loop: Option<LoopStatus>,
    config_sources: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoopStatus {
    status: GateStatus,
    attempts_used: u32,
    max_attempts: u32,
}

pub fn execute_status_command(run_id: Option<String>, json: bool, config: &Config) -> Result<ExitCode> {
    let run_id = require_run_id(run_id)?;
    let store = artifact_store(config);
    store.require_run(&run_id)?;

    let report: Option<VerificationReport> =
        store.read_json(&run_id, Phase::Verification, REPORT_JSON)?;
    let state = AutoFixState::load(&store, &run_id)?;
    let last_loop: Option<LoopSummary> = store.read_json(&run_id, Phase::Fix, LOOP_SUMMARY_JSON)?;

    if json {
        let output = StatusOutput {
            run_id: run_id.clone(),
            verification: report.as_ref().map(|r| r.status),
            gates: report
                .as_ref()
                .map(|r| r.ordered_gates().map(|g| (g.id.clone(), g.status)).collect())
                .unwrap_or_default(),
            spec_version: state.spec_version,
            attempt_in_spec: state.attempt_in_spec,
            last_failure_fingerprint: state.last_failure_fingerprint.clone(),
            history_len: state.history.len(),
            last_loop: last_loop.as_ref().map(|l| LoopStatus {
                status: l.status,
                attempts_used: l.attempts_used,
                max_attempts: l.max_attempts,
            }),
            config_sources: CONFIG_KEYS
                .iter()
                .map(|key| (key.to_string(), config.source_of(key).to_string()))
                .collect(),
        };
        println!("{}", emit_jcs(&output).context("Failed to emit status JSON")?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Status for run: {run_id}");
    match &report {
        Some(report) => {
            println!("  Verification: {} ({})", report.status, report.timestamp.to_rfc3339());
            print_gate_lines(report);
        }
        None => println!("  Verification: not run yet"),
    }

    println!("\nAutoFix state:");
    println!("  Spec version: {}", state.spec_version);
    println!(
        "  Attempts on current failure: {}/{}",
        state.attempt_in_spec,
        pipeforge_fixup::MAX_ATTEMPTS
    );
    if let Some(fingerprint) = &state.last_failure_fingerprint {
        println!("  Last failure fingerprint: {fingerprint}");
    }
    println!("  Recorded attempts: {}", state.history.len());

    if let Some(summary) = &last_loop {
        println!(
            "\nLast loop: {} after {}/{} attempt(s)",
            summary.status, summary.attempts_used, summary.max_attempts
        );
    }

    println!("\nConfiguration:");
    println!("  Runs directory: {}", config.runs_root());
    for key in CONFIG_KEYS {
        println!("  {key}: {}", config.source_of(key));
    }

    Ok(ExitCode::SUCCESS)
}
