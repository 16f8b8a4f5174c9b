//! `Verify`/`Fix` for the production Verifier and FixSession.

use camino::Utf8Path;

use pipeforge_fixup::{FixOptions, FixSession};
use pipeforge_gate::{VerificationReport, Verifier, VerifyOptions};
use pipeforge_runner::ProcessRunner;
use pipeforge_utils::error::PipeforgeError;

use crate::traits::{Fix, FixStep, Verify};

impl<R: ProcessRunner> Verify for Verifier<R> {
    fn run_verification(
        &mut self,
        run_id: &str,
        project: &Utf8Path,
        fast: bool,
    ) -> Result<VerificationReport, PipeforgeError> {
        self.verify(run_id, project, VerifyOptions { fast, json: false })
    }
}

impl<R: ProcessRunner> Fix for FixSession<R> {
    fn run_fix(&mut self, run_id: &str, project: &Utf8Path) -> Result<FixStep, PipeforgeError> {
        let options = FixOptions {
            project_path: Some(project.to_path_buf()),
            ..FixOptions::default()
        };
        let report = self.run(run_id, &options)?;
        Ok(FixStep {
            attempt_dir: report.attempt,
            halted: report.halted(),
            applied: report.outcome.applied.len(),
            manual: report.outcome.manual.len(),
        })
    }
}
