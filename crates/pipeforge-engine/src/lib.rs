//! Loop controller for pipeforge
//!
//! Composes verification and fixing into a bounded retry loop. The loop
//! bounds attempts within one invocation; the per-fingerprint ceiling lives
//! in `pipeforge-fixup` and is enforced independently.

pub mod adapters;
pub mod controller;
pub mod summary;
pub mod traits;

pub use controller::{LoopController, LoopOptions};
pub use summary::{LOOP_SUMMARY_JSON, LOOP_SUMMARY_MD, LoopAttempt, LoopSummary};
pub use traits::{Fix, FixStep, Verify};
