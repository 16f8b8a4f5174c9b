//! Human-readable renderings of a verification report

use std::fmt::Write;

use camino::Utf8Path;

use crate::types::{GateStatus, VerificationReport};

/// Lines of output kept per failing command in the markdown report.
const EXCERPT_LINES: usize = 20;

/// Narrative log written to `verification.log`.
#[must_use]
pub fn render_log(report: &VerificationReport, project: &Utf8Path, fast: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}] verify run={} project={} fast={}",
        report.timestamp.to_rfc3339(),
        report.run_id,
        project,
        fast
    );

    for gate in report.ordered_gates() {
        let _ = writeln!(out, "[{}] {} - {}", gate.id, gate.status, gate.message);
    }

    for command in &report.commands {
        let _ = writeln!(
            out,
            "$ {} (exit {}, {} ms{})",
            command.cmd,
            command.exit_code,
            command.duration_ms,
            if command.timed_out { ", timed out" } else { "" }
        );
        for (label, stream) in [("stdout", &command.stdout), ("stderr", &command.stderr)] {
            for line in stream.lines() {
                let _ = writeln!(out, "  {label}| {line}");
            }
        }
    }

    for violation in &report.violations {
        let _ = writeln!(
            out,
            "violation [{}] {}: {}",
            violation.kind, violation.rule, violation.detail
        );
    }

    let _ = writeln!(
        out,
        "RESULT: {} ({} failed, {} passed) next: {}",
        report.status,
        report.summary.failed_count,
        report.summary.passed_count,
        report.summary.next_action
    );
    out
}

/// Markdown report written to `verification.report.md`.
#[must_use]
pub fn render_markdown(report: &VerificationReport) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Verification Report\n");
    let _ = writeln!(md, "- **Run:** `{}`", report.run_id);
    let _ = writeln!(md, "- **Time:** {}", report.timestamp.to_rfc3339());
    let _ = writeln!(md, "- **Status:** {}", status_badge(report.status));
    let _ = writeln!(
        md,
        "- **Gates:** {} passed, {} failed",
        report.summary.passed_count, report.summary.failed_count
    );
    let _ = writeln!(md, "- **Next action:** {}\n", report.summary.next_action);

    let _ = writeln!(md, "## Gates\n");
    let _ = writeln!(md, "| Gate | Status | Message |");
    let _ = writeln!(md, "|------|--------|---------|");
    for gate in report.ordered_gates() {
        let _ = writeln!(
            md,
            "| {} | {} | {} |",
            gate.id,
            status_badge(gate.status),
            gate.message.replace('|', "\\|")
        );
    }

    let missing: Vec<&str> = report
        .deliverables
        .iter()
        .filter(|d| !d.exists)
        .map(|d| d.path.as_str())
        .collect();
    if !missing.is_empty() {
        let _ = writeln!(md, "\n## Missing Deliverables\n");
        for path in missing {
            let _ = writeln!(md, "- `{path}`");
        }
    }

    if !report.violations.is_empty() {
        let _ = writeln!(md, "\n## Constraint Violations\n");
        for v in &report.violations {
            let _ = writeln!(md, "- **{}** ({}): {}", v.rule, v.kind, v.detail);
        }
    }

    let failed: Vec<_> = report.commands.iter().filter(|c| !c.success).collect();
    if !failed.is_empty() {
        let _ = writeln!(md, "\n## Failed Commands");
        for command in failed {
            let _ = writeln!(
                md,
                "\n### `{}` (exit {})\n\n```text\n{}\n```",
                command.cmd,
                command.exit_code,
                excerpt(&command.stderr, &command.stdout)
            );
        }
    }

    md
}

fn status_badge(status: GateStatus) -> &'static str {
    match status {
        GateStatus::Pass => "**PASS**",
        GateStatus::Fail => "**FAIL**",
    }
}

/// Last lines of stderr, or stdout when stderr is empty.
fn excerpt(stderr: &str, stdout: &str) -> String {
    let source = if stderr.trim().is_empty() { stdout } else { stderr };
    let lines: Vec<&str> = source.lines().collect();
    let start = lines.len().saturating_sub(EXCERPT_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommandResult, DeliverableCheck, GateId, GateResult, Violation};
    use chrono::Utc;

    fn failing_report() -> VerificationReport {
        VerificationReport::assemble(
            "20260101_0000_x",
            Utc::now(),
            vec![
                GateResult::new(GateId::Deliverables, false, "1 of 1 deliverables missing"),
                GateResult::new(GateId::Commands, false, "1 of 1 commands failed"),
            ],
            vec![CommandResult {
                cmd: "npm test".into(),
                exit_code: 1,
                stdout: "noise".into(),
                stderr: "Error: expected 1 to equal 2".into(),
                duration_ms: 40,
                success: false,
                timed_out: false,
            }],
            vec![Violation {
                kind: "dependency".into(),
                rule: "MUST NOT add database".into(),
                detail: "package.json dependencies: pg".into(),
            }],
            vec![DeliverableCheck {
                path: "README.md".into(),
                exists: false,
                matched: vec![],
            }],
        )
    }

    #[test]
    fn test_markdown_sections() {
        let md = render_markdown(&failing_report());
        assert!(md.contains("**Status:** **FAIL**"));
        assert!(md.contains("| G_DELIVERABLES | **FAIL** |"));
        assert!(md.contains("- `README.md`"));
        assert!(md.contains("MUST NOT add database"));
        assert!(md.contains("expected 1 to equal 2"));
        assert!(!md.contains("noise"));
    }

    #[test]
    fn test_log_ends_with_result_line() {
        let log = render_log(&failing_report(), Utf8Path::new("/p"), false);
        assert!(log.contains("$ npm test (exit 1, 40 ms)"));
        assert!(log.trim_end().ends_with("RESULT: FAIL (2 failed, 0 passed) next: fix"));
    }

    #[test]
    fn test_excerpt_falls_back_to_stdout() {
        assert_eq!(excerpt("  ", "a\nb"), "a\nb");
    }
}
