//! Verification report model
//!
//! Serialized with camelCase keys; `status` values are always uppercase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pass/fail outcome shared by gates and the report as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
    Pass,
    Fail,
}

impl GateStatus {
    #[must_use]
    pub const fn from_passed(passed: bool) -> Self {
        if passed { Self::Pass } else { Self::Fail }
    }

    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five gates, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateId {
    Deliverables,
    MustNot,
    MvpSize,
    Commands,
    SpecExists,
}

impl GateId {
    pub const ALL: [GateId; 5] = [
        GateId::Deliverables,
        GateId::MustNot,
        GateId::MvpSize,
        GateId::Commands,
        GateId::SpecExists,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deliverables => "G_DELIVERABLES",
            Self::MustNot => "G_MUST_NOT",
            Self::MvpSize => "G_MVP_SIZE",
            Self::Commands => "G_COMMANDS",
            Self::SpecExists => "G_SPEC_EXISTS",
        }
    }

    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gate| gate.as_str() == id)
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub id: String,
    pub status: GateStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GateResult {
    #[must_use]
    pub fn new(id: GateId, passed: bool, message: impl Into<String>) -> Self {
        Self {
            id: id.as_str().to_string(),
            status: GateStatus::from_passed(passed),
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.status.is_pass()
    }
}

/// One executed verification command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub cmd: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

/// A negative-constraint violation found by `G_MUST_NOT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: String,
    pub rule: String,
    pub detail: String,
}

/// Existence check for one declared deliverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableCheck {
    pub path: String,
    pub exists: bool,
    /// Concrete paths a `*` pattern matched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<String>,
}

/// What the pipeline should do after this verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Deploy,
    Fix,
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy => f.write_str("deploy"),
            Self::Fix => f.write_str("fix"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub failed_count: usize,
    pub passed_count: usize,
    pub next_action: NextAction,
}

/// Authoritative output of one verify pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: GateStatus,
    pub gates: BTreeMap<String, GateResult>,
    pub commands: Vec<CommandResult>,
    pub violations: Vec<Violation>,
    pub deliverables: Vec<DeliverableCheck>,
    pub summary: ReportSummary,
}

impl VerificationReport {
    /// Assemble a report; `status` and `summary` are derived from `gates`.
    #[must_use]
    pub fn assemble(
        run_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        gates: Vec<GateResult>,
        commands: Vec<CommandResult>,
        violations: Vec<Violation>,
        deliverables: Vec<DeliverableCheck>,
    ) -> Self {
        let gates: BTreeMap<String, GateResult> =
            gates.into_iter().map(|g| (g.id.clone(), g)).collect();
        let summary = summarize(&gates);
        let status = GateStatus::from_passed(summary.failed_count == 0);

        Self {
            run_id: run_id.into(),
            timestamp,
            status,
            gates,
            commands,
            violations,
            deliverables,
            summary,
        }
    }

    /// Gate results in execution order, followed by any unknown ids.
    pub fn ordered_gates(&self) -> impl Iterator<Item = &GateResult> {
        let known = GateId::ALL
            .into_iter()
            .filter_map(|id| self.gates.get(id.as_str()));
        let unknown = self
            .gates
            .values()
            .filter(|g| GateId::parse(&g.id).is_none());
        known.chain(unknown)
    }

    #[must_use]
    pub fn gate(&self, id: GateId) -> Option<&GateResult> {
        self.gates.get(id.as_str())
    }

    #[must_use]
    pub fn failed_gates(&self) -> Vec<&GateResult> {
        self.ordered_gates().filter(|g| !g.passed()).collect()
    }

    /// Recompute status from the gate map; true when the stored status agrees.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let expected = GateStatus::from_passed(self.gates.values().all(GateResult::passed));
        self.status == expected && self.summary == summarize(&self.gates)
    }
}

fn summarize(gates: &BTreeMap<String, GateResult>) -> ReportSummary {
    let failed_count = gates.values().filter(|g| !g.passed()).count();
    let passed_count = gates.len() - failed_count;
    ReportSummary {
        failed_count,
        passed_count,
        next_action: if failed_count == 0 {
            NextAction::Deploy
        } else {
            NextAction::Fix
        },
    }
}
