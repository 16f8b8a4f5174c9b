//! CLI entry point and dispatch
//!
//! `run()` parses arguments, discovers configuration once, initialises
//! tracing, dispatches to the command handler and prints every error. It
//! returns the exit code for main to use.

use clap::Parser;

use pipeforge_config::{CliArgs, Config};
use pipeforge_utils::error::PipeforgeError;
use pipeforge_utils::exit_codes::ExitCode;
use pipeforge_utils::logging::init_tracing;

use super::args::{Cli, Commands};
use super::commands;

/// Main CLI execution function.
///
/// Returns `Ok(())` for exit code 0; any other outcome (a FAIL verdict or an
/// error that has already been printed) is returned as `Err(code)`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    let operation = cli.command.name();
    let error_code = error_exit_code(&cli.command);

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        runs_dir: cli.runs_dir.clone(),
        command_timeout_secs: cli.command_timeout,
        max_loop_attempts: match &cli.command {
            Commands::Loop { max_attempts, .. } => *max_attempts,
            _ => None,
        },
        package_manager: cli.package_manager.clone(),
        verbose: cli.verbose.then_some(true),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.display_for_user());
            return Err(error_code);
        }
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }
    tracing::debug!(
        operation,
        root = %config.workspace.root_path,
        runs_root = %config.runs_root(),
        "configuration resolved"
    );

    let result = match cli.command {
        Commands::Init { description, json } => {
            commands::execute_init_command(&description.join(" "), json, &config)
        }
        Commands::Verify {
            run_id,
            path,
            fast,
            json,
        } => commands::execute_verify_command(run_id, path, fast, json, &config),
        Commands::Fix {
            run_id,
            attempt_num,
            project_path,
            approve_change,
            dry_run,
            rerun_qa,
            json,
        } => commands::execute_fix_command(
            run_id,
            attempt_num,
            project_path,
            approve_change,
            dry_run,
            rerun_qa,
            json,
            &config,
        ),
        Commands::Loop {
            run_id,
            path,
            fast,
            json,
            ..
        } => commands::execute_loop_command(run_id, path, fast, json, &config),
        Commands::Status { run_id, json } => {
            commands::execute_status_command(run_id, json, &config)
        }
    };

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(error) => {
            if let Some(pipeforge_error) = error.downcast_ref::<PipeforgeError>() {
                eprintln!("{}", pipeforge_error.display_for_user());
            } else {
                eprintln!("Error: {error:#}");
                eprintln!("\n  Run with --verbose for more detailed output");
            }
            tracing::debug!(operation, error = %format!("{error:#}"), "command failed");
            Err(error_code)
        }
    }
}

/// `fix` reports runtime errors as 1; `verify`, `loop` and the rest use 2.
fn error_exit_code(command: &Commands) -> ExitCode {
    match command {
        Commands::Fix { .. } => ExitCode::FAILURE,
        _ => ExitCode::RUNTIME_ERROR,
    }
}
