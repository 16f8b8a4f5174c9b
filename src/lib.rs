//! pipeforge: verify/fix/loop control core for agentic software-generation
//! pipelines.
//!
//! A run is a directory of phase artifacts (`10_intake` … `80_deploy`). The
//! [`Verifier`] checks the generated project in `50_implementation` against
//! the run's Definition of Done, the [`FixSession`] triages failures and
//! applies what it can within the AutoFix ceiling, and the
//! [`LoopController`] alternates the two until PASS or the attempt budget
//! is spent.
//!
//! The `pipeforge` binary exposes `init`, `verify`, `fix`, `loop` and
//! `status`; everything it does is available through the re-exports below.

pub mod cli;

pub use pipeforge_artifact::ArtifactStore;
pub use pipeforge_config::{CliArgs, Config, PackageManager};
pub use pipeforge_dod::DefinitionOfDone;
pub use pipeforge_engine::{Fix, FixStep, LoopController, LoopOptions, LoopSummary, Verify};
pub use pipeforge_fixup::{AutoFixState, FixOptions, FixReport, FixSession, FixStatus, Fixer};
pub use pipeforge_fixup_model::{BlockingIssue, FailureCategory, Triage, failure_fingerprint, triage};
pub use pipeforge_gate::{GateId, GateStatus, VerificationReport, Verifier, VerifyOptions};
pub use pipeforge_runner::{CommandSpec, NativeRunner, ProcessOutput, ProcessRunner};
pub use pipeforge_utils::error::PipeforgeError;
pub use pipeforge_utils::exit_codes::ExitCode;
pub use pipeforge_utils::types::Phase;
