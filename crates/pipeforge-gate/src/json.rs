//! JSON emission for verification reports

use anyhow::Context;
use pipeforge_utils::canonicalization::emit_jcs;

use crate::types::VerificationReport;

/// Emit the report as canonical JSON (RFC 8785) for `--json` output.
pub fn emit_report_json(report: &VerificationReport) -> anyhow::Result<String> {
    emit_jcs(report).context("Failed to emit verification report JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GateId, GateResult};
    use chrono::Utc;

    #[test]
    fn test_emit_is_canonical_and_parseable() {
        let report = VerificationReport::assemble(
            "20260101_0000_x",
            Utc::now(),
            vec![GateResult::new(GateId::SpecExists, true, "Spec present")],
            vec![],
            vec![],
            vec![],
        );

        let json = emit_report_json(&report).unwrap();
        assert!(!json.contains('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["status"], "PASS");
        assert_eq!(parsed["gates"]["G_SPEC_EXISTS"]["message"], "Spec present");
    }
}
