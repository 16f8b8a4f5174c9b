//! Init command implementation

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

use pipeforge_config::Config;
use pipeforge_utils::canonicalization::emit_jcs;
use pipeforge_utils::exit_codes::ExitCode;
use pipeforge_utils::run_id::generate_run_id;

use super::common::artifact_store;

/// Create a run for `description` and print its id.
pub fn execute_init_command(description: &str, json: bool, config: &Config) -> Result<ExitCode> {
    let store = artifact_store(config);
    let run_id = generate_run_id(Utc::now(), description);
    let run_dir = store.create_run(&run_id)?;
    tracing::info!(run_id = %run_id, path = %run_dir, "run created");

    if json {
        let output = json!({ "runId": run_id, "path": run_dir.as_str() });
        println!("{}", emit_jcs(&output).context("Failed to emit init JSON")?);
    } else {
        println!("{run_id}");
        eprintln!("  ✓ Created run directory: {run_dir}");
    }
    Ok(ExitCode::SUCCESS)
}
