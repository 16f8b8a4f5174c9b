//! The loop summary artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use pipeforge_gate::GateStatus;

use crate::traits::FixStep;

pub const LOOP_SUMMARY_JSON: &str = "loop_summary.json";
pub const LOOP_SUMMARY_MD: &str = "loop_summary.md";

/// One verify (and maybe fix) round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopAttempt {
    pub attempt: u32,
    pub status: GateStatus,
    pub failed_gates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixStep>,
}

/// Persisted as `70_fix/loop_summary.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSummary {
    pub run_id: String,
    pub status: GateStatus,
    /// Verify attempts actually made. Lower than `max_attempts` when a
    /// verification passed early or the AutoFix ceiling halted the fix step.
    pub attempts_used: u32,
    pub max_attempts: u32,
    /// The AutoFix ceiling ended the loop before `max_attempts`
    pub halted_by_ceiling: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub attempts: Vec<LoopAttempt>,
}

impl LoopSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status.is_pass()
    }

    /// Number of fix steps the loop ran.
    #[must_use]
    pub fn fixes_run(&self) -> usize {
        self.attempts.iter().filter(|a| a.fix.is_some()).count()
    }

    #[must_use]
    pub fn render_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Loop Summary: {}\n", self.run_id);
        let _ = writeln!(md, "- Status: **{}**", self.status.as_str());
        let _ = writeln!(
            md,
            "- Attempts used: {} of {}",
            self.attempts_used, self.max_attempts
        );
        if self.halted_by_ceiling {
            let _ = writeln!(
                md,
                "- Halted by the AutoFix ceiling; see the latest `fix_summary.md`"
            );
        }
        let _ = writeln!(md, "- Started: {}", self.started_at.to_rfc3339());
        let _ = writeln!(md, "- Finished: {}\n", self.finished_at.to_rfc3339());

        let _ = writeln!(md, "| Attempt | Status | Failed gates | Fix |");
        let _ = writeln!(md, "|---------|--------|--------------|-----|");
        for attempt in &self.attempts {
            let failed = if attempt.failed_gates.is_empty() {
                "-".to_string()
            } else {
                attempt.failed_gates.join(", ")
            };
            let fix = match attempt.fix {
                None => "-".to_string(),
                Some(step) if step.halted => format!("halted (attempt_{})", step.attempt_dir),
                Some(step) => format!(
                    "attempt_{}: {} applied, {} manual",
                    step.attempt_dir, step.applied, step.manual
                ),
            };
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} |",
                attempt.attempt,
                attempt.status.as_str(),
                failed,
                fix
            );
        }
        md
    }
}
