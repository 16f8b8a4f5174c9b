//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pipeforge - verify, fix and loop over generated projects
#[derive(Parser, Debug)]
#[command(name = "pipeforge")]
#[command(about = "Verify/fix/loop control core for agentic software-generation pipelines")]
#[command(long_about = r#"
pipeforge checks a generated project against its run's Definition of Done,
classifies failures, applies the fixes it can, and loops until the project
passes or the attempt budget is spent.

EXAMPLES:
  # Create a run
  pipeforge init "todo app with tags"

  # Verify the implementation (exit 0 PASS, 1 FAIL, 2 error)
  pipeforge verify --run-id 20260309_1405_todo-app-with-tags

  # One fix cycle, guidance only
  pipeforge fix --run-id 20260309_1405_todo-app-with-tags --dry-run

  # Approve a spec change after the AutoFix ceiling was reached
  pipeforge fix --run-id 20260309_1405_todo-app-with-tags --approve-change

  # Verify and fix up to five times
  pipeforge loop --run-id 20260309_1405_todo-app-with-tags --max-attempts 5

CONFIGURATION:
  Precedence: CLI flags > .pipeforge/config.toml > defaults.
  The config file is discovered by walking up from the current directory;
  PIPEFORGE_HOME pins the workspace root.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding runs, relative to the workspace root
    #[arg(long, global = true)]
    pub runs_dir: Option<String>,

    /// Timeout in seconds for each verification command and install (min: 1)
    #[arg(long, global = true)]
    pub command_timeout: Option<u64>,

    /// Package manager for dependency installs (npm, pnpm, yarn, pip)
    #[arg(long, global = true)]
    pub package_manager: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new run with all phase directories
    Init {
        /// Free-text description the run id is derived from
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the verification gates against a project
    Verify {
        #[arg(long, env = "RUN_ID")]
        run_id: Option<String>,

        /// Project to verify (default: the run's 50_implementation directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Skip verification commands
        #[arg(long)]
        fast: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Triage the latest verification and attempt fixes
    Fix {
        #[arg(long, env = "RUN_ID")]
        run_id: Option<String>,

        /// Attempt directory number (default: next free)
        #[arg(long)]
        attempt_num: Option<u32>,

        /// Project to fix (default: the run's 50_implementation directory)
        #[arg(long)]
        project_path: Option<PathBuf>,

        /// Approve a spec change: bump the spec version and reset the ceiling
        #[arg(long)]
        approve_change: bool,

        /// Triage and guidance only; nothing is installed or recorded
        #[arg(long)]
        dry_run: bool,

        /// Re-run verification after applying fixes
        #[arg(long)]
        rerun_qa: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Alternate verify and fix until PASS or the attempt budget is spent
    Loop {
        #[arg(long, env = "RUN_ID")]
        run_id: Option<String>,

        /// Maximum verify attempts (default: 3, or max_loop_attempts from config)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Project to verify and fix (default: the run's 50_implementation directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Skip verification commands
        #[arg(long)]
        fast: bool,

        /// Output the loop summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show verification, AutoFix and loop state for a run
    Status {
        #[arg(long, env = "RUN_ID")]
        run_id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Verify { .. } => "verify",
            Self::Fix { .. } => "fix",
            Self::Loop { .. } => "loop",
            Self::Status { .. } => "status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fix_flags() {
        let cli = Cli::try_parse_from([
            "pipeforge",
            "fix",
            "--run-id",
            "20260309_1405_x",
            "--attempt-num",
            "4",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Fix {
                run_id,
                attempt_num,
                dry_run,
                approve_change,
                ..
            } => {
                assert_eq!(run_id.as_deref(), Some("20260309_1405_x"));
                assert_eq!(attempt_num, Some(4));
                assert!(dry_run);
                assert!(!approve_change);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pipeforge",
            "loop",
            "--run-id",
            "20260309_1405_x",
            "--max-attempts",
            "5",
            "--verbose",
            "--command-timeout",
            "30",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.command_timeout, Some(30));
        assert_eq!(cli.command.name(), "loop");
    }

    #[test]
    fn test_init_requires_description() {
        assert!(Cli::try_parse_from(["pipeforge", "init"]).is_err());
    }
}
