//! Seams between the loop and the components it drives.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use pipeforge_gate::VerificationReport;
use pipeforge_utils::error::PipeforgeError;

/// Produces a verification report for a run.
pub trait Verify {
    fn run_verification(
        &mut self,
        run_id: &str,
        project: &Utf8Path,
        fast: bool,
    ) -> Result<VerificationReport, PipeforgeError>;
}

/// Attempts to fix the failures of the latest verification.
pub trait Fix {
    fn run_fix(&mut self, run_id: &str, project: &Utf8Path) -> Result<FixStep, PipeforgeError>;
}

/// What one fix step did, as seen by the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixStep {
    /// `70_fix/attempt_<n>` directory holding the fix record
    pub attempt_dir: u32,
    /// The AutoFix ceiling stopped the fix; no point re-verifying
    pub halted: bool,
    pub applied: usize,
    pub manual: usize,
}
