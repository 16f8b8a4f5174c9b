//! The Fixer: mechanical fixes where possible, guidance everywhere else.
//!
//! Only `missing_dependency` is applied automatically, by running the
//! project's install command once per invocation. Every other issue becomes a
//! manual fix carrying ordered remediation steps.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use pipeforge_config::PackageManager;
use pipeforge_fixup_model::{BlockingIssue, FailureCategory};
use pipeforge_runner::{NativeRunner, ProcessRunner};

use crate::guidance::remediation_steps;
use crate::install::{InstallResult, detect_package_manager, install_command, run_install};

/// A fix that was carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFix {
    pub check: String,
    pub category: FailureCategory,
    pub action: String,
    pub success: bool,
}

/// An issue left to a human or an external agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualFix {
    pub check: String,
    pub category: FailureCategory,
    pub fixable: bool,
    pub reason: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOutcome {
    pub applied: Vec<AppliedFix>,
    pub manual: Vec<ManualFix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallResult>,
}

#[derive(Debug, Clone)]
pub struct Fixer<R = NativeRunner> {
    runner: R,
    package_manager: Option<PackageManager>,
    timeout: Duration,
}

impl Fixer<NativeRunner> {
    #[must_use]
    pub fn new(package_manager: Option<PackageManager>, timeout: Duration) -> Self {
        Self::with_runner(NativeRunner::new(), package_manager, timeout)
    }
}

impl<R: ProcessRunner> Fixer<R> {
    /// `package_manager` overrides detection when set.
    #[must_use]
    pub fn with_runner(runner: R, package_manager: Option<PackageManager>, timeout: Duration) -> Self {
        Self {
            runner,
            package_manager,
            timeout,
        }
    }

    /// Partition `issues` into applied and manual fixes.
    ///
    /// With `dry_run` nothing is executed; dependency installs are reported
    /// as manual steps instead.
    pub fn fix(&self, project: &Utf8Path, issues: &[BlockingIssue], dry_run: bool) -> FixOutcome {
        let mut outcome = FixOutcome::default();
        let manager = self
            .package_manager
            .or_else(|| detect_package_manager(project));

        for issue in issues {
            if !issue.triage.fixable {
                outcome.manual.push(manual(issue, Vec::new()));
                continue;
            }

            if issue.category() != FailureCategory::MissingDependency {
                outcome.manual.push(manual(issue, Vec::new()));
                continue;
            }

            let Some(manager) = manager else {
                let mut fix = manual(issue, Vec::new());
                fix.reason = "No package manager could be detected for the project".to_string();
                outcome.manual.push(fix);
                continue;
            };

            if dry_run {
                let command = install_command(manager, project).display();
                outcome
                    .manual
                    .push(manual(issue, vec![format!("Run `{command}` in the project")]));
                continue;
            }

            let install = outcome
                .install
                .get_or_insert_with(|| run_install(&self.runner, manager, project, self.timeout));
            outcome.applied.push(AppliedFix {
                check: issue.check.clone(),
                category: issue.category(),
                action: install.command.clone(),
                success: install.success,
            });
        }

        tracing::info!(
            applied = outcome.applied.len(),
            manual = outcome.manual.len(),
            dry_run,
            "fix pass finished"
        );
        outcome
    }
}

fn manual(issue: &BlockingIssue, leading: Vec<String>) -> ManualFix {
    let mut steps = leading;
    if let Some(suggestion) = &issue.triage.suggestion {
        steps.push(suggestion.clone());
    }
    steps.extend(
        remediation_steps(issue.category())
            .iter()
            .map(|s| (*s).to_string()),
    );

    ManualFix {
        check: issue.check.clone(),
        category: issue.category(),
        fixable: issue.triage.fixable,
        reason: issue.triage.reason.clone(),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pipeforge_fixup_model::Triage;
    use pipeforge_runner::{CommandSpec, ProcessOutput, RunnerError};
    use std::cell::Cell;
    use tempfile::TempDir;

    struct CountingRunner {
        calls: Cell<usize>,
        exit_code: i32,
    }

    impl ProcessRunner for CountingRunner {
        fn run(&self, _cmd: &CommandSpec, _timeout: Duration) -> Result<ProcessOutput, RunnerError> {
            self.calls.set(self.calls.get() + 1);
            Ok(ProcessOutput::new(
                b"added 3 packages".to_vec(),
                vec![],
                Some(self.exit_code),
                Duration::from_millis(10),
            ))
        }
    }

    fn runner(exit_code: i32) -> CountingRunner {
        CountingRunner {
            calls: Cell::new(0),
            exit_code,
        }
    }

    fn issue(check: &str, category: FailureCategory, fixable: bool) -> BlockingIssue {
        BlockingIssue::new(
            check,
            "msg",
            Triage::new(fixable, category, "reason", Some("suggested".to_string())),
        )
    }

    fn npm_project() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        std::fs::write(root.join("package.json"), "{}").unwrap();
        (temp, root)
    }

    #[test]
    fn test_install_runs_once_for_all_missing_dependencies() {
        let (_t, root) = npm_project();
        let fixer = Fixer::with_runner(runner(0), None, Duration::from_secs(5));
        let issues = vec![
            issue("G_COMMANDS:npm test", FailureCategory::MissingDependency, true),
            issue("G_COMMANDS:npm start", FailureCategory::MissingDependency, true),
        ];

        let outcome = fixer.fix(&root, &issues, false);

        assert_eq!(fixer.runner.calls.get(), 1);
        assert_eq!(outcome.applied.len(), 2);
        assert!(outcome.applied.iter().all(|a| a.success && a.action == "npm install"));
        assert!(outcome.manual.is_empty());
        assert!(outcome.install.unwrap().success);
    }

    #[test]
    fn test_failed_install_is_recorded() {
        let (_t, root) = npm_project();
        let fixer = Fixer::with_runner(runner(1), None, Duration::from_secs(5));
        let outcome = fixer.fix(
            &root,
            &[issue("c", FailureCategory::MissingDependency, true)],
            false,
        );
        assert!(!outcome.applied[0].success);
    }

    #[test]
    fn test_other_categories_become_guidance() {
        let (_t, root) = npm_project();
        let fixer = Fixer::with_runner(runner(0), None, Duration::from_secs(5));
        let outcome = fixer.fix(
            &root,
            &[
                issue("a", FailureCategory::TestMismatch, true),
                issue("b", FailureCategory::ScopeMismatch, false),
            ],
            false,
        );

        assert_eq!(fixer.runner.calls.get(), 0);
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.manual.len(), 2);
        assert_eq!(outcome.manual[0].steps[0], "suggested");
        assert_eq!(
            outcome.manual[0].steps.len(),
            1 + remediation_steps(FailureCategory::TestMismatch).len()
        );
        assert!(!outcome.manual[1].fixable);
    }

    #[test]
    fn test_dry_run_executes_nothing() {
        let (_t, root) = npm_project();
        let fixer = Fixer::with_runner(runner(0), None, Duration::from_secs(5));
        let outcome = fixer.fix(&root, &[issue("c", FailureCategory::MissingDependency, true)], true);

        assert_eq!(fixer.runner.calls.get(), 0);
        assert!(outcome.install.is_none());
        assert_eq!(outcome.manual[0].steps[0], "Run `npm install` in the project");
    }

    #[test]
    fn test_override_wins_and_missing_manager_is_manual() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

        let none = Fixer::with_runner(runner(0), None, Duration::from_secs(5));
        let outcome = none.fix(&root, &[issue("c", FailureCategory::MissingDependency, true)], false);
        assert_eq!(outcome.manual.len(), 1);
        assert_eq!(none.runner.calls.get(), 0);

        let pinned = Fixer::with_runner(runner(0), Some(PackageManager::Yarn), Duration::from_secs(5));
        let outcome = pinned.fix(&root, &[issue("c", FailureCategory::MissingDependency, true)], false);
        assert_eq!(outcome.applied[0].action, "yarn install");
    }
}
