//! The Verifier: five gates in a fixed order, one report per pass.

use camino::Utf8Path;
use chrono::Utc;
use std::time::Duration;

use pipeforge_artifact::ArtifactStore;
use pipeforge_dod::DefinitionOfDone;
use pipeforge_runner::{NativeRunner, ProcessRunner};
use pipeforge_utils::error::PipeforgeError;
use pipeforge_utils::types::Phase;

use crate::commands::{check_commands, skipped_gate};
use crate::deliverables::check_deliverables;
use crate::must_not::check_must_not;
use crate::mvp::check_mvp_size;
use crate::render::{render_log, render_markdown};
use crate::types::{GateId, GateResult, VerificationReport};

pub const REPORT_JSON: &str = "verification.report.json";
pub const REPORT_LOG: &str = "verification.log";
pub const REPORT_MARKDOWN: &str = "verification.report.md";

pub const DOD_FILE: &str = "DEFINITION_OF_DONE.md";
pub const SPEC_FILE: &str = "spec.md";
pub const INTAKE_FILE: &str = "intake.json";

/// Options for one verify pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Skip `G_COMMANDS` (reported as a pass)
    pub fast: bool,
    /// Print the report as JSON instead of text
    pub json: bool,
}

/// Runs the gates for a run and persists the report artifacts.
#[derive(Debug, Clone)]
pub struct Verifier<R = NativeRunner> {
    store: ArtifactStore,
    runner: R,
    command_timeout: Duration,
}

impl Verifier<NativeRunner> {
    #[must_use]
    pub fn new(store: ArtifactStore, command_timeout: Duration) -> Self {
        Self::with_runner(store, NativeRunner::new(), command_timeout)
    }
}

impl<R: ProcessRunner> Verifier<R> {
    #[must_use]
    pub fn with_runner(store: ArtifactStore, runner: R, command_timeout: Duration) -> Self {
        Self {
            store,
            runner,
            command_timeout,
        }
    }

    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Verify `project` against the run's Definition of Done.
    ///
    /// Writes `verification.report.json`, `verification.log` and
    /// `verification.report.md` into the run's verification directory.
    ///
    /// # Errors
    ///
    /// Fails only when the run does not exist, the DoD is missing or
    /// unparseable, or the report cannot be written.
    pub fn verify(
        &self,
        run_id: &str,
        project: &Utf8Path,
        options: VerifyOptions,
    ) -> Result<VerificationReport, PipeforgeError> {
        self.store.require_run(run_id)?;
        let dod = DefinitionOfDone::load(&self.store.artifact_path(run_id, Phase::Spec, DOD_FILE))?;

        let span = tracing::info_span!("verify", run_id, project = %project, fast = options.fast);
        let _guard = span.enter();

        let (deliverables_gate, deliverables) = check_deliverables(project, &dod.deliverables);
        log_gate(&deliverables_gate);

        let (must_not_gate, violations) = check_must_not(project, &dod.metadata);
        log_gate(&must_not_gate);

        let mvp_gate =
            check_mvp_size(&self.store.artifact_path(run_id, Phase::Intake, INTAKE_FILE));
        log_gate(&mvp_gate);

        let (commands_gate, commands) = if options.fast {
            (skipped_gate(), Vec::new())
        } else {
            check_commands(&self.runner, project, &dod.commands, self.command_timeout)
        };
        log_gate(&commands_gate);

        let spec_gate = if self.store.exists(run_id, Phase::Spec, SPEC_FILE) {
            GateResult::new(GateId::SpecExists, true, "Spec document present")
        } else {
            GateResult::new(
                GateId::SpecExists,
                false,
                format!("Spec document missing: {}/{SPEC_FILE}", Phase::Spec.dir_name()),
            )
        };
        log_gate(&spec_gate);

        let report = VerificationReport::assemble(
            run_id,
            Utc::now(),
            vec![deliverables_gate, must_not_gate, mvp_gate, commands_gate, spec_gate],
            commands,
            violations,
            deliverables,
        );

        self.persist(&report, project, options.fast)?;

        tracing::info!(
            status = %report.status,
            failed = report.summary.failed_count,
            passed = report.summary.passed_count,
            "verification finished"
        );
        Ok(report)
    }

    /// Last persisted report for `run_id`, if any.
    pub fn load_report(&self, run_id: &str) -> Result<Option<VerificationReport>, PipeforgeError> {
        self.store.read_json(run_id, Phase::Verification, REPORT_JSON)
    }

    fn persist(
        &self,
        report: &VerificationReport,
        project: &Utf8Path,
        fast: bool,
    ) -> Result<(), PipeforgeError> {
        let run_id = report.run_id.as_str();
        self.store
            .write_json(run_id, Phase::Verification, REPORT_JSON, report)?;
        self.store.write_text(
            run_id,
            Phase::Verification,
            REPORT_LOG,
            &render_log(report, project, fast),
        )?;
        self.store.write_text(
            run_id,
            Phase::Verification,
            REPORT_MARKDOWN,
            &render_markdown(report),
        )?;
        Ok(())
    }
}

fn log_gate(gate: &GateResult) {
    if gate.passed() {
        tracing::info!(gate = %gate.id, message = %gate.message, "gate passed");
    } else {
        tracing::warn!(gate = %gate.id, message = %gate.message, "gate failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GateStatus;
    use camino::Utf8PathBuf;
    use pipeforge_utils::error::{DodError, RunError};
    use tempfile::TempDir;

    const RUN: &str = "20260309_1405_todo";

    const DOD: &str = "---
project_kind: web_app
constraints:
  auth: none
---

## Deliverables
- [ ] `package.json`
- [ ] `src/index.js`

## Verification
```bash
exit 0
```
";

    struct Fixture {
        _temp: TempDir,
        store: ArtifactStore,
        project: Utf8PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let store = ArtifactStore::new(root.join("runs"));
        store.create_run(RUN).unwrap();
        store.write_text(RUN, Phase::Spec, DOD_FILE, DOD).unwrap();
        store.write_text(RUN, Phase::Spec, SPEC_FILE, "# Spec\n").unwrap();
        store
            .write_text(RUN, Phase::Intake, INTAKE_FILE, r#"{"mvp_features": ["a", "b"]}"#)
            .unwrap();

        let project = store.phase_dir(RUN, Phase::Implementation);
        std::fs::create_dir_all(project.join("src")).unwrap();
        std::fs::write(project.join("package.json"), r#"{"dependencies": {}}"#).unwrap();
        std::fs::write(project.join("src/index.js"), "").unwrap();

        Fixture {
            _temp: temp,
            store,
            project,
        }
    }

    fn verifier(store: &ArtifactStore) -> Verifier {
        Verifier::new(store.clone(), Duration::from_secs(60))
    }

    #[test]
    fn test_fast_pass_writes_all_artifacts() {
        let f = fixture();
        let report = verifier(&f.store)
            .verify(RUN, &f.project, VerifyOptions { fast: true, json: false })
            .unwrap();

        assert_eq!(report.status, GateStatus::Pass);
        assert_eq!(report.gates.len(), 5);
        assert!(report.commands.is_empty());
        assert_eq!(
            report.gate(GateId::Commands).unwrap().message,
            "Skipped (fast mode)"
        );
        for name in [REPORT_JSON, REPORT_LOG, REPORT_MARKDOWN] {
            assert!(f.store.exists(RUN, Phase::Verification, name), "{name}");
        }

        let loaded = verifier(&f.store).load_report(RUN).unwrap().unwrap();
        assert_eq!(loaded.gates, report.gates);
    }

    #[test]
    fn test_missing_pieces_fail_their_gates_only() {
        let f = fixture();
        std::fs::remove_file(f.project.join("src/index.js")).unwrap();
        std::fs::remove_file(f.store.artifact_path(RUN, Phase::Spec, SPEC_FILE)).unwrap();
        std::fs::write(
            f.project.join("package.json"),
            r#"{"dependencies": {"jsonwebtoken": "^9.0.0"}}"#,
        )
        .unwrap();

        let report = verifier(&f.store)
            .verify(RUN, &f.project, VerifyOptions { fast: true, json: false })
            .unwrap();

        let failed: Vec<&str> = report.failed_gates().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(failed, vec!["G_DELIVERABLES", "G_MUST_NOT", "G_SPEC_EXISTS"]);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.status, GateStatus::Fail);
    }

    #[test]
    fn test_verify_is_idempotent_on_unchanged_project() {
        let f = fixture();
        let v = verifier(&f.store);
        let opts = VerifyOptions { fast: true, json: false };
        let first = v.verify(RUN, &f.project, opts).unwrap();
        let second = v.verify(RUN, &f.project, opts).unwrap();

        assert_eq!(first.gates, second.gates);
        assert_eq!(first.status, second.status);
    }

    #[test]
    fn test_missing_run_is_runtime_error() {
        let f = fixture();
        let err = verifier(&f.store)
            .verify("20260101_0000_nope", &f.project, VerifyOptions::default())
            .unwrap_err();
        assert!(matches!(err, PipeforgeError::Run(RunError::NotFound { .. })));
    }

    #[test]
    fn test_missing_dod_is_runtime_error() {
        let f = fixture();
        std::fs::remove_file(f.store.artifact_path(RUN, Phase::Spec, DOD_FILE)).unwrap();
        let err = verifier(&f.store)
            .verify(RUN, &f.project, VerifyOptions::default())
            .unwrap_err();
        assert!(matches!(err, PipeforgeError::Dod(DodError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_commands_run_in_project_dir() {
        let f = fixture();
        let dod = DOD.replace("exit 0", "test -f package.json\nfalse");
        f.store.write_text(RUN, Phase::Spec, DOD_FILE, &dod).unwrap();

        let report = verifier(&f.store)
            .verify(RUN, &f.project, VerifyOptions::default())
            .unwrap();

        assert_eq!(report.commands.len(), 2);
        assert!(report.commands[0].success);
        assert!(!report.commands[1].success);
        assert!(!report.gate(GateId::Commands).unwrap().passed());
    }
}
