//! The bounded verify/fix loop.

use camino::Utf8PathBuf;
use chrono::Utc;

use pipeforge_artifact::ArtifactStore;
use pipeforge_gate::GateStatus;
use pipeforge_utils::error::{ConfigError, PipeforgeError};
use pipeforge_utils::types::Phase;

use crate::summary::{LOOP_SUMMARY_JSON, LOOP_SUMMARY_MD, LoopAttempt, LoopSummary};
use crate::traits::{Fix, Verify};

/// Options recognised by the `loop` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOptions {
    pub max_attempts: u32,
    /// Project to verify and fix; defaults to the run's implementation directory
    pub project_path: Option<Utf8PathBuf>,
    pub fast: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            project_path: None,
            fast: false,
        }
    }
}

/// Drives `Verify` and `Fix` until PASS, the attempt budget runs out, or the
/// fixer reports that its ceiling was reached.
pub struct LoopController<V, F> {
    store: ArtifactStore,
    verifier: V,
    fixer: F,
}

impl<V: Verify, F: Fix> LoopController<V, F> {
    pub fn new(store: ArtifactStore, verifier: V, fixer: F) -> Self {
        Self {
            store,
            verifier,
            fixer,
        }
    }

    /// Run the loop and persist `loop_summary.json` and `loop_summary.md`.
    ///
    /// The fixer is never invoked after the last allowed attempt, since no
    /// verification would follow it.
    pub fn run(&mut self, run_id: &str, options: &LoopOptions) -> Result<LoopSummary, PipeforgeError> {
        if options.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_attempts".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        self.store.require_run(run_id)?;

        let project = options
            .project_path
            .clone()
            .unwrap_or_else(|| self.store.phase_dir(run_id, Phase::Implementation));
        let started_at = Utc::now();
        let mut attempts = Vec::new();
        let mut status = GateStatus::Fail;
        let mut halted_by_ceiling = false;

        for attempt in 1..=options.max_attempts {
            let report = self
                .verifier
                .run_verification(run_id, &project, options.fast)?;
            let failed_gates: Vec<String> =
                report.failed_gates().iter().map(|g| g.id.clone()).collect();
            tracing::info!(
                run_id,
                attempt,
                status = report.status.as_str(),
                failed = failed_gates.len(),
                "loop verification finished"
            );

            let mut entry = LoopAttempt {
                attempt,
                status: report.status,
                failed_gates,
                fix: None,
            };

            if report.status.is_pass() {
                status = GateStatus::Pass;
                attempts.push(entry);
                break;
            }

            if attempt == options.max_attempts {
                tracing::warn!(run_id, attempt, "max attempts reached");
                attempts.push(entry);
                break;
            }

            let step = self.fixer.run_fix(run_id, &project)?;
            entry.fix = Some(step);
            attempts.push(entry);

            if step.halted {
                tracing::warn!(run_id, attempt, "fix halted by AutoFix ceiling; stopping loop");
                halted_by_ceiling = true;
                break;
            }
        }

        let summary = LoopSummary {
            run_id: run_id.to_string(),
            status,
            attempts_used: u32::try_from(attempts.len()).unwrap_or(u32::MAX),
            max_attempts: options.max_attempts,
            halted_by_ceiling,
            started_at,
            finished_at: Utc::now(),
            attempts,
        };

        self.store
            .write_json(run_id, Phase::Fix, LOOP_SUMMARY_JSON, &summary)?;
        self.store
            .write_text(run_id, Phase::Fix, LOOP_SUMMARY_MD, &summary.render_markdown())?;
        Ok(summary)
    }

    #[must_use]
    pub fn into_parts(self) -> (V, F) {
        (self.verifier, self.fixer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FixStep;
    use camino::Utf8Path;
    use pipeforge_gate::{GateId, GateResult, VerificationReport};
    use std::collections::VecDeque;
    use tempfile::TempDir;

    const RUN: &str = "20260309_1405_loop";

    struct ScriptedVerifier {
        outcomes: VecDeque<bool>,
        calls: u32,
    }

    impl ScriptedVerifier {
        fn new(outcomes: &[bool]) -> Self {
            Self {
                outcomes: outcomes.iter().copied().collect(),
                calls: 0,
            }
        }
    }

    impl Verify for ScriptedVerifier {
        fn run_verification(
            &mut self,
            run_id: &str,
            _project: &Utf8Path,
            _fast: bool,
        ) -> Result<VerificationReport, PipeforgeError> {
            self.calls += 1;
            let passed = self.outcomes.pop_front().unwrap_or(false);
            Ok(VerificationReport::assemble(
                run_id,
                Utc::now(),
                vec![GateResult::new(GateId::Commands, passed, "scripted")],
                vec![],
                vec![],
                vec![],
            ))
        }
    }

    #[derive(Default)]
    struct CountingFixer {
        calls: u32,
        halt_on_call: Option<u32>,
    }

    impl Fix for CountingFixer {
        fn run_fix(&mut self, _run_id: &str, _project: &Utf8Path) -> Result<FixStep, PipeforgeError> {
            self.calls += 1;
            Ok(FixStep {
                attempt_dir: self.calls,
                halted: self.halt_on_call == Some(self.calls),
                applied: 0,
                manual: 1,
            })
        }
    }

    fn store() -> (TempDir, ArtifactStore) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let store = ArtifactStore::new(root);
        store.create_run(RUN).unwrap();
        (temp, store)
    }

    fn options(max_attempts: u32) -> LoopOptions {
        LoopOptions {
            max_attempts,
            ..LoopOptions::default()
        }
    }

    #[test]
    fn test_always_failing_never_fixes_after_last_attempt() {
        let (_t, store) = store();
        let mut controller = LoopController::new(
            store.clone(),
            ScriptedVerifier::new(&[]),
            CountingFixer::default(),
        );

        let summary = controller.run(RUN, &options(3)).unwrap();
        let (verifier, fixer) = controller.into_parts();

        assert_eq!(summary.status, GateStatus::Fail);
        assert_eq!(summary.attempts_used, 3);
        assert_eq!(verifier.calls, 3);
        assert_eq!(fixer.calls, 2);
        assert!(summary.attempts[2].fix.is_none());
        assert!(store.exists(RUN, Phase::Fix, LOOP_SUMMARY_JSON));
        assert!(store.exists(RUN, Phase::Fix, LOOP_SUMMARY_MD));
    }

    #[test]
    fn test_fail_then_pass_fixes_once() {
        let (_t, store) = store();
        let mut controller = LoopController::new(
            store,
            ScriptedVerifier::new(&[false, true]),
            CountingFixer::default(),
        );

        let summary = controller.run(RUN, &options(3)).unwrap();
        let (verifier, fixer) = controller.into_parts();

        assert!(summary.passed());
        assert_eq!(summary.attempts_used, 2);
        assert_eq!(verifier.calls, 2);
        assert_eq!(fixer.calls, 1);
    }

    #[test]
    fn test_ceiling_halt_stops_loop() {
        let (_t, store) = store();
        let mut controller = LoopController::new(
            store,
            ScriptedVerifier::new(&[]),
            CountingFixer {
                calls: 0,
                halt_on_call: Some(1),
            },
        );

        let summary = controller.run(RUN, &options(5)).unwrap();
        let (verifier, fixer) = controller.into_parts();

        assert_eq!(summary.status, GateStatus::Fail);
        assert!(summary.halted_by_ceiling);
        assert_eq!(summary.attempts_used, 1);
        assert_eq!(verifier.calls, 1);
        assert_eq!(fixer.calls, 1);
    }

    #[test]
    fn test_single_attempt_never_fixes() {
        let (_t, store) = store();
        let mut controller =
            LoopController::new(store, ScriptedVerifier::new(&[]), CountingFixer::default());

        let summary = controller.run(RUN, &options(1)).unwrap();
        assert_eq!(summary.fixes_run(), 0);
        assert_eq!(summary.attempts_used, 1);
    }

    #[test]
    fn test_zero_attempts_and_missing_run_are_errors() {
        let (_t, store) = store();
        let mut controller =
            LoopController::new(store, ScriptedVerifier::new(&[]), CountingFixer::default());

        assert!(matches!(
            controller.run(RUN, &options(0)),
            Err(PipeforgeError::Config(_))
        ));
        assert!(matches!(
            controller.run("20260309_1405_other", &options(2)),
            Err(PipeforgeError::Run(_))
        ));
    }

    #[test]
    fn test_summary_json_uses_uppercase_status() {
        let (_t, store) = store();
        let mut controller = LoopController::new(
            store.clone(),
            ScriptedVerifier::new(&[true]),
            CountingFixer::default(),
        );
        controller.run(RUN, &options(3)).unwrap();

        let raw = store
            .read_text(RUN, Phase::Fix, LOOP_SUMMARY_JSON)
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["status"], "PASS");
        assert_eq!(value["attemptsUsed"], 1);
    }
}
