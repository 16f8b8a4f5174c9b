//! One `fix` invocation: issues → fingerprint → ceiling → Fixer → artifacts.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use pipeforge_artifact::ArtifactStore;
use pipeforge_config::PackageManager;
use pipeforge_fixup_model::{
    BlockingIssue, QaReport, failure_fingerprint, issues_from_qa, issues_from_report,
};
use pipeforge_gate::{REPORT_JSON, VerificationReport};
use pipeforge_runner::{NativeRunner, ProcessRunner};
use pipeforge_utils::error::PipeforgeError;
use pipeforge_utils::types::Phase;

use crate::fixer::{FixOutcome, Fixer};
use crate::state::{AutoFixState, Decision};
use crate::summary::{render_attempt_summary, render_ceiling_summary};

pub const FIX_RESULT: &str = "fix_result.json";
pub const FIX_SUMMARY: &str = "fix_summary.md";
pub const QA_REPORT: &str = "qa_report.json";

const ATTEMPT_DIR_PREFIX: &str = "attempt_";

/// Options recognised by the `fix` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixOptions {
    /// Attempt directory number; defaults to one past the highest existing
    pub attempt_num: Option<u32>,
    /// Project to fix; defaults to the run's implementation directory
    pub project_path: Option<Utf8PathBuf>,
    pub approve_change: bool,
    pub dry_run: bool,
    /// Re-verify after fixing
    pub rerun_qa: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    Attempted,
    DryRun,
    Halted,
    NothingToFix,
}

/// Persisted as `70_fix/attempt_<n>/fix_result.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixReport {
    pub run_id: String,
    pub attempt: u32,
    pub timestamp: DateTime<Utc>,
    pub status: FixStatus,
    pub spec_version: u32,
    pub fingerprint: Option<String>,
    pub decision: Option<Decision>,
    pub issues: Vec<BlockingIssue>,
    #[serde(flatten)]
    pub outcome: FixOutcome,
}

impl FixReport {
    /// True when the attempt ceiling stopped this cycle.
    #[must_use]
    pub fn halted(&self) -> bool {
        self.status == FixStatus::Halted
    }
}

pub struct FixSession<R = NativeRunner> {
    store: ArtifactStore,
    fixer: Fixer<R>,
}

impl FixSession<NativeRunner> {
    #[must_use]
    pub fn new(store: ArtifactStore, package_manager: Option<PackageManager>, timeout: Duration) -> Self {
        Self::with_fixer(store, Fixer::new(package_manager, timeout))
    }
}

impl<R: ProcessRunner> FixSession<R> {
    #[must_use]
    pub fn with_fixer(store: ArtifactStore, fixer: Fixer<R>) -> Self {
        Self { store, fixer }
    }

    /// Approve a spec change: bump the spec version and persist.
    pub fn approve_change(&self, run_id: &str) -> Result<AutoFixState, PipeforgeError> {
        self.store.require_run(run_id)?;
        let mut state = AutoFixState::load(&self.store, run_id)?;
        state.bump_spec_version();
        state.save(&self.store, run_id)?;
        Ok(state)
    }

    /// Blocking issues from the verification report, or from the legacy QA
    /// report when no verification report exists.
    pub fn blocking_issues(&self, run_id: &str) -> Result<Vec<BlockingIssue>, PipeforgeError> {
        if let Some(report) = self
            .store
            .read_json::<VerificationReport>(run_id, Phase::Verification, REPORT_JSON)?
        {
            return Ok(issues_from_report(&report));
        }

        if let Some(qa) = self
            .store
            .read_json::<QaReport>(run_id, Phase::Verification, QA_REPORT)?
        {
            tracing::info!(run_id, "using legacy QA report");
            return Ok(issues_from_qa(&qa));
        }

        tracing::warn!(run_id, "no verification or QA report found; nothing to fix");
        Ok(Vec::new())
    }

    /// One past the highest `attempt_<n>` directory under the fix phase.
    pub fn next_attempt_num(&self, run_id: &str) -> Result<u32, PipeforgeError> {
        let fix_dir = self.store.phase_dir(run_id, Phase::Fix);
        if !fix_dir.is_dir() {
            return Ok(1);
        }

        let mut highest = 0;
        for entry in fs::read_dir(&fix_dir)? {
            let entry = entry?;
            if let Some(n) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_prefix(ATTEMPT_DIR_PREFIX))
                .and_then(|n| n.parse::<u32>().ok())
            {
                highest = highest.max(n);
            }
        }
        Ok(highest + 1)
    }

    /// Run one fix cycle for `run_id`.
    pub fn run(&self, run_id: &str, options: &FixOptions) -> Result<FixReport, PipeforgeError> {
        self.store.require_run(run_id)?;
        let span = tracing::info_span!("fix", run_id, dry_run = options.dry_run);
        let _guard = span.enter();

        let issues = self.blocking_issues(run_id)?;
        let mut state = AutoFixState::load(&self.store, run_id)?;
        let attempt = match options.attempt_num {
            Some(n) => n,
            None => self.next_attempt_num(run_id)?,
        };

        if issues.is_empty() {
            return Ok(FixReport {
                run_id: run_id.to_string(),
                attempt,
                timestamp: Utc::now(),
                status: FixStatus::NothingToFix,
                spec_version: state.spec_version,
                fingerprint: None,
                decision: None,
                issues,
                outcome: FixOutcome::default(),
            });
        }

        let fingerprint = failure_fingerprint(&issues);
        let decision = state.should_proceed(&fingerprint);
        tracing::info!(
            fingerprint = %fingerprint,
            proceed = decision.proceed,
            reason = decision.reason.as_str(),
            issues = issues.len(),
            "autofix decision"
        );

        if !decision.proceed {
            let summary = render_ceiling_summary(run_id, &fingerprint, &state, &issues);
            let report = FixReport {
                run_id: run_id.to_string(),
                attempt,
                timestamp: Utc::now(),
                status: FixStatus::Halted,
                spec_version: state.spec_version,
                fingerprint: Some(fingerprint),
                decision: Some(decision),
                issues,
                outcome: FixOutcome::default(),
            };
            self.write_attempt(&report, &summary)?;
            tracing::warn!(attempt, "autofix ceiling reached; human decision required");
            return Ok(report);
        }

        let project = options
            .project_path
            .clone()
            .unwrap_or_else(|| self.store.phase_dir(run_id, Phase::Implementation));
        let outcome = self.fixer.fix(&project, &issues, options.dry_run);

        if !options.dry_run {
            state.record_attempt(&fingerprint, &issues, Utc::now());
            state.save(&self.store, run_id)?;
        }

        let summary = render_attempt_summary(
            run_id,
            attempt,
            &fingerprint,
            &decision,
            &outcome,
            options.dry_run,
        );
        let report = FixReport {
            run_id: run_id.to_string(),
            attempt,
            timestamp: Utc::now(),
            status: if options.dry_run {
                FixStatus::DryRun
            } else {
                FixStatus::Attempted
            },
            spec_version: state.spec_version,
            fingerprint: Some(fingerprint),
            decision: Some(decision),
            issues,
            outcome,
        };
        self.write_attempt(&report, &summary)?;
        Ok(report)
    }

    fn write_attempt(&self, report: &FixReport, summary: &str) -> Result<(), PipeforgeError> {
        let dir = format!("{ATTEMPT_DIR_PREFIX}{}", report.attempt);
        self.store.write_json(
            &report.run_id,
            Phase::Fix,
            &format!("{dir}/{FIX_RESULT}"),
            report,
        )?;
        self.store
            .write_text(&report.run_id, Phase::Fix, &format!("{dir}/{FIX_SUMMARY}"), summary)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeforge_gate::{CommandResult, GateId, GateResult};
    use pipeforge_runner::{CommandSpec, ProcessOutput, RunnerError};
    use tempfile::TempDir;

    const RUN: &str = "20260309_1405_fix";

    struct NoopRunner;

    impl ProcessRunner for NoopRunner {
        fn run(&self, _cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, RunnerError> {
            Ok(ProcessOutput::new(vec![], vec![], Some(0), Duration::ZERO))
        }
    }

    fn session() -> (TempDir, FixSession<NoopRunner>) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let store = ArtifactStore::new(root);
        store.create_run(RUN).unwrap();
        let fixer = Fixer::with_runner(NoopRunner, None, Duration::from_secs(5));
        (temp, FixSession::with_fixer(store, fixer))
    }

    fn write_failing_report(session: &FixSession<NoopRunner>, stderr: &str) {
        let report = VerificationReport::assemble(
            RUN,
            Utc::now(),
            vec![GateResult::new(GateId::Commands, false, "1 of 1 commands failed")],
            vec![CommandResult {
                cmd: "npm test".into(),
                exit_code: 1,
                stdout: String::new(),
                stderr: stderr.into(),
                duration_ms: 1,
                success: false,
                timed_out: false,
            }],
            vec![],
            vec![],
        );
        session
            .store
            .write_json(RUN, Phase::Verification, REPORT_JSON, &report)
            .unwrap();
    }

    #[test]
    fn test_third_identical_cycle_halts_with_summary() {
        let (_t, session) = session();
        write_failing_report(&session, "AssertionError: expected 1 to equal 2");
        let opts = FixOptions::default();

        let first = session.run(RUN, &opts).unwrap();
        let second = session.run(RUN, &opts).unwrap();
        let third = session.run(RUN, &opts).unwrap();

        assert_eq!(first.status, FixStatus::Attempted);
        assert_eq!((first.attempt, second.attempt, third.attempt), (1, 2, 3));
        assert_eq!(second.status, FixStatus::Attempted);
        assert!(third.halted());

        let summary = session
            .store
            .read_text(RUN, Phase::Fix, "attempt_3/fix_summary.md")
            .unwrap()
            .unwrap();
        assert!(summary.contains("AutoFix Halted"));
        assert_eq!(AutoFixState::load(&session.store, RUN).unwrap().history.len(), 2);
    }

    #[test]
    fn test_approve_change_unsticks() {
        let (_t, session) = session();
        write_failing_report(&session, "AssertionError");
        let opts = FixOptions::default();
        session.run(RUN, &opts).unwrap();
        session.run(RUN, &opts).unwrap();

        let state = session.approve_change(RUN).unwrap();
        assert_eq!(state.spec_version, 2);

        let next = session.run(RUN, &opts).unwrap();
        assert_eq!(next.status, FixStatus::Attempted);
        assert_eq!(next.spec_version, 2);
    }

    #[test]
    fn test_dry_run_does_not_record() {
        let (_t, session) = session();
        write_failing_report(&session, "Error: Cannot find module 'x'");
        let report = session
            .run(RUN, &FixOptions { dry_run: true, ..FixOptions::default() })
            .unwrap();

        assert_eq!(report.status, FixStatus::DryRun);
        assert!(report.outcome.applied.is_empty());
        assert_eq!(AutoFixState::load(&session.store, RUN).unwrap(), AutoFixState::default());
        assert!(session.store.exists(RUN, Phase::Fix, "attempt_1/fix_result.json"));
    }

    #[test]
    fn test_legacy_qa_and_nothing_to_fix() {
        let (_t, session) = session();
        let report = session.run(RUN, &FixOptions::default()).unwrap();
        assert_eq!(report.status, FixStatus::NothingToFix);
        assert_eq!(session.next_attempt_num(RUN).unwrap(), 1);

        session
            .store
            .write_text(
                RUN,
                Phase::Verification,
                QA_REPORT,
                r#"{"checks": [{"name": "tests", "passed": false, "error": "AssertionError"}]}"#,
            )
            .unwrap();
        let report = session
            .run(RUN, &FixOptions { attempt_num: Some(7), ..FixOptions::default() })
            .unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.attempt, 7);
        assert_eq!(session.next_attempt_num(RUN).unwrap(), 8);
    }
}
