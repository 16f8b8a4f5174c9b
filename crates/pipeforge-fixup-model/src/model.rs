use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure taxonomy. The first five are what triage treats as fixable; the
/// next four block automation; the rest come from structural gate results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    ImplementationBug,
    MissingDependency,
    ConfigIssue,
    DockerIssue,
    TestMismatch,
    ScopeMismatch,
    SecurityBlocker,
    ArchitectureIssue,
    ExternalDependency,
    MissingDeliverable,
    MustNotViolation,
    CommandFailed,
    Unknown,
}

impl FailureCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImplementationBug => "implementation_bug",
            Self::MissingDependency => "missing_dependency",
            Self::ConfigIssue => "config_issue",
            Self::DockerIssue => "docker_issue",
            Self::TestMismatch => "test_mismatch",
            Self::ScopeMismatch => "scope_mismatch",
            Self::SecurityBlocker => "security_blocker",
            Self::ArchitectureIssue => "architecture_issue",
            Self::ExternalDependency => "external_dependency",
            Self::MissingDeliverable => "missing_deliverable",
            Self::MustNotViolation => "must_not_violation",
            Self::CommandFailed => "command_failed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
    pub fixable: bool,
    pub category: FailureCategory,
    pub reason: String,
    pub suggestion: Option<String>,
}

impl Triage {
    #[must_use]
    pub fn new(
        fixable: bool,
        category: FailureCategory,
        reason: impl Into<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self {
            fixable,
            category,
            reason: reason.into(),
            suggestion,
        }
    }
}

/// What the fix cycle intends to do with an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    AutoFix,
    Escalate,
}

/// A failing check together with its triage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingIssue {
    pub check: String,
    pub message: String,
    pub triage: Triage,
    pub action: IssueAction,
}

impl BlockingIssue {
    /// Build an issue; the action follows the triage's fixability.
    #[must_use]
    pub fn new(check: impl Into<String>, message: impl Into<String>, triage: Triage) -> Self {
        let action = if triage.fixable {
            IssueAction::AutoFix
        } else {
            IssueAction::Escalate
        };
        Self {
            check: check.into(),
            message: message.into(),
            triage,
            action,
        }
    }

    #[must_use]
    pub fn category(&self) -> FailureCategory {
        self.triage.category
    }
}
