//! Markdown fix summaries

use std::fmt::Write;

use pipeforge_fixup_model::BlockingIssue;

use crate::fixer::FixOutcome;
use crate::state::{AutoFixState, Decision, MAX_ATTEMPTS};

/// Summary for an attempt that went ahead.
#[must_use]
pub fn render_attempt_summary(
    run_id: &str,
    attempt: u32,
    fingerprint: &str,
    decision: &Decision,
    outcome: &FixOutcome,
    dry_run: bool,
) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Fix Attempt {attempt}\n");
    let _ = writeln!(md, "- **Run:** `{run_id}`");
    let _ = writeln!(md, "- **Fingerprint:** `{fingerprint}`");
    let _ = writeln!(
        md,
        "- **Decision:** {} ({} attempt(s) remaining)",
        decision.reason.as_str(),
        decision.attempts_remaining
    );
    if dry_run {
        let _ = writeln!(md, "- **Mode:** dry run (nothing executed, state unchanged)");
    }

    if !outcome.applied.is_empty() {
        let _ = writeln!(md, "\n## Applied\n");
        for fix in &outcome.applied {
            let _ = writeln!(
                md,
                "- `{}` [{}]: `{}` {}",
                fix.check,
                fix.category,
                fix.action,
                if fix.success { "succeeded" } else { "failed" }
            );
        }
    }

    if !outcome.manual.is_empty() {
        let _ = writeln!(md, "\n## Manual Fixes Required");
        for fix in &outcome.manual {
            let _ = writeln!(md, "\n### `{}` [{}]\n", fix.check, fix.category);
            let _ = writeln!(md, "{}\n", fix.reason);
            for (n, step) in fix.steps.iter().enumerate() {
                let _ = writeln!(md, "{}. {step}", n + 1);
            }
        }
    }

    md
}

/// Summary written when the attempt ceiling stops the fix cycle.
#[must_use]
pub fn render_ceiling_summary(
    run_id: &str,
    fingerprint: &str,
    state: &AutoFixState,
    issues: &[BlockingIssue],
) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# AutoFix Halted: Human Decision Required\n");
    let _ = writeln!(
        md,
        "Run `{run_id}` hit the same failures {MAX_ATTEMPTS} times under spec version {}. \
         No further automatic fix will be attempted for fingerprint `{fingerprint}`.",
        state.spec_version
    );

    let _ = writeln!(md, "\n## Blocking Issues\n");
    for issue in issues {
        let _ = writeln!(
            md,
            "- `{}` [{}]: {}",
            issue.check, issue.triage.category, issue.message
        );
    }

    let _ = writeln!(md, "\n## Attempt History\n");
    let _ = writeln!(md, "| # | Spec version | Fingerprint | Time | Issues |");
    let _ = writeln!(md, "|---|--------------|-------------|------|--------|");
    for record in &state.history {
        let _ = writeln!(
            md,
            "| {} | {} | `{}` | {} | {} |",
            record.attempt,
            record.spec_version,
            record.fingerprint,
            record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            record.issues.len()
        );
    }

    let _ = writeln!(md, "\n## Options\n");
    let _ = writeln!(
        md,
        "1. **Fix manually.** Resolve the issues above in the project, then run `pipeforge verify --run-id {run_id}`."
    );
    let _ = writeln!(
        md,
        "2. **Approve a spec change.** Update the specification, then run `pipeforge fix --run-id {run_id} --approve-change` to start a new spec version with a fresh attempt budget."
    );
    let _ = writeln!(
        md,
        "3. **Reduce scope.** Drop the failing features from the intake and Definition of Done, then approve the change."
    );

    md
}
