//! Fix cycle for pipeforge
//!
//! A fix invocation derives blocking issues from the latest verification,
//! fingerprints them, asks the [`AutoFixState`] whether another attempt
//! against that fingerprint is allowed, and then lets the [`Fixer`] apply
//! what it can mechanically and turn everything else into guidance.

pub mod fixer;
pub mod guidance;
pub mod install;
pub mod session;
pub mod state;
pub mod summary;

pub use fixer::{AppliedFix, FixOutcome, Fixer, ManualFix};
pub use install::{InstallResult, detect_package_manager, install_command};
pub use session::{FixOptions, FixReport, FixSession, FixStatus};
pub use state::{AttemptRecord, AutoFixState, Decision, MAX_ATTEMPTS, ProceedReason};
