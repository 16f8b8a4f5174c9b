//! Blocking issues derived from verification output

use serde::{Deserialize, Serialize};

use pipeforge_gate::{GateId, VerificationReport};

use crate::model::{BlockingIssue, FailureCategory, Triage};
use crate::triage::triage;

/// Legacy `qa_report.json` produced by older pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaReport {
    #[serde(default)]
    pub checks: Vec<QaCheck>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaCheck {
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

/// Blocking issues for every failing gate item in `report`.
///
/// Missing deliverables, constraint violations and failed commands each
/// yield one issue; an MVP or spec failure blocks on scope.
#[must_use]
pub fn issues_from_report(report: &VerificationReport) -> Vec<BlockingIssue> {
    let mut issues = Vec::new();

    for gate in report.failed_gates() {
        let before = issues.len();
        match GateId::parse(&gate.id) {
            Some(GateId::Deliverables) => {
                for missing in report.deliverables.iter().filter(|d| !d.exists) {
                    issues.push(BlockingIssue::new(
                        format!("{}:{}", gate.id, missing.path),
                        format!("Deliverable `{}` is missing", missing.path),
                        Triage::new(
                            true,
                            FailureCategory::MissingDeliverable,
                            "A declared deliverable does not exist in the project",
                            Some(format!("Create `{}` in the project", missing.path)),
                        ),
                    ));
                }
            }
            Some(GateId::MustNot) => {
                for violation in &report.violations {
                    issues.push(BlockingIssue::new(
                        format!("{}:{}", gate.id, violation.detail),
                        format!("{} ({})", violation.rule, violation.detail),
                        Triage::new(
                            true,
                            FailureCategory::MustNotViolation,
                            "The project violates a negative constraint",
                            Some(format!("Remove {} from the project", violation.detail)),
                        ),
                    ));
                }
            }
            Some(GateId::Commands) => {
                for command in report.commands.iter().filter(|c| !c.success) {
                    let check = format!("{}:{}", gate.id, command.cmd);
                    let message = format!("`{}` exited with {}", command.cmd, command.exit_code);
                    let triaged = if command.timed_out {
                        Triage::new(
                            true,
                            FailureCategory::CommandFailed,
                            "Command timed out",
                            Some("Make the command terminate or raise the timeout".to_string()),
                        )
                    } else {
                        triage(&check, &command.stderr, &command.stdout)
                    };
                    issues.push(BlockingIssue::new(check, message, triaged));
                }
            }
            Some(GateId::MvpSize) => issues.push(BlockingIssue::new(
                gate.id.clone(),
                gate.message.clone(),
                Triage::new(
                    false,
                    FailureCategory::ScopeMismatch,
                    "The intake does not define a viable MVP",
                    Some("Add at least two MVP features to the intake".to_string()),
                ),
            )),
            Some(GateId::SpecExists) => issues.push(BlockingIssue::new(
                gate.id.clone(),
                gate.message.clone(),
                Triage::new(
                    false,
                    FailureCategory::ScopeMismatch,
                    "There is no specification to implement against",
                    Some("Re-run the spec phase".to_string()),
                ),
            )),
            None => {}
        }

        if issues.len() == before {
            issues.push(BlockingIssue::new(
                gate.id.clone(),
                gate.message.clone(),
                triage(&gate.id, &gate.message, ""),
            ));
        }
    }

    issues
}

/// Blocking issues for every failed check of a legacy QA report.
#[must_use]
pub fn issues_from_qa(qa: &QaReport) -> Vec<BlockingIssue> {
    qa.checks
        .iter()
        .filter(|check| !check.passed)
        .map(|check| {
            let error = check.error.as_deref().unwrap_or_default();
            let output = check.output.as_deref().unwrap_or_default();
            let message = if error.is_empty() {
                "Check failed".to_string()
            } else {
                error.lines().next().unwrap_or(error).to_string()
            };
            BlockingIssue::new(&check.name, message, triage(&check.name, error, output))
        })
        .collect()
}
