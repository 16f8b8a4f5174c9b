//! Verification gates for pipeforge
//!
//! The [`Verifier`] runs five gates in a fixed order against a generated
//! project and produces a [`VerificationReport`]. Gate failures are data, not
//! errors: only a missing run or an unusable Definition of Done aborts a
//! verification.

pub mod commands;
pub mod deliverables;
pub mod json;
pub mod must_not;
pub mod mvp;
pub mod render;
pub mod types;
pub mod verifier;

pub use types::{
    CommandResult, DeliverableCheck, GateId, GateResult, GateStatus, NextAction, ReportSummary,
    VerificationReport, Violation,
};
pub use verifier::{
    REPORT_JSON, REPORT_LOG, REPORT_MARKDOWN, Verifier, VerifyOptions,
};
