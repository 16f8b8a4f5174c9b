//! Failure model for the fix cycle
//!
//! Blocking issues are always recomputed from the latest verification report
//! (or a legacy QA report); they are never persisted on their own.

pub mod fingerprint;
pub mod issues;
pub mod model;
pub mod triage;

pub use fingerprint::failure_fingerprint;
pub use issues::{QaCheck, QaReport, issues_from_qa, issues_from_report};
pub use model::{BlockingIssue, FailureCategory, IssueAction, Triage};
pub use triage::triage;
