//! AutoFix state machine
//!
//! Persisted per run in `60_verification/autofix_state.json`. The ceiling is
//! per failure fingerprint: at most [`MAX_ATTEMPTS`] fix attempts may target
//! the same fingerprint within one spec version.
//!
//! Callers check [`AutoFixState::should_proceed`] against the state *before*
//! the current attempt is counted and only call
//! [`AutoFixState::record_attempt`] when proceeding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pipeforge_artifact::ArtifactStore;
use pipeforge_fixup_model::{BlockingIssue, FailureCategory};
use pipeforge_utils::error::PipeforgeError;
use pipeforge_utils::types::Phase;

/// Fix attempts allowed against one failure fingerprint per spec version
pub const MAX_ATTEMPTS: u32 = 2;

pub const STATE_FILE: &str = "autofix_state.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFixState {
    pub spec_version: u32,
    pub attempt_in_spec: u32,
    pub last_failure_fingerprint: Option<String>,
    #[serde(default)]
    pub history: Vec<AttemptRecord>,
}

impl Default for AutoFixState {
    fn default() -> Self {
        Self {
            spec_version: 1,
            attempt_in_spec: 0,
            last_failure_fingerprint: None,
            history: Vec::new(),
        }
    }
}

/// One recorded fix attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub spec_version: u32,
    pub fingerprint: String,
    pub timestamp: DateTime<Utc>,
    pub issues: Vec<IssueRef>,
}

/// The identifying part of a blocking issue kept in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub check: String,
    pub category: FailureCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProceedReason {
    NewFailurePattern,
    AttemptsRemaining,
    MaxAttemptsReached,
}

impl ProceedReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewFailurePattern => "new_failure_pattern",
            Self::AttemptsRemaining => "attempts_remaining",
            Self::MaxAttemptsReached => "max_attempts_reached",
        }
    }
}

/// Ceiling decision for one fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub proceed: bool,
    pub reason: ProceedReason,
    pub attempts_remaining: u32,
}

impl AutoFixState {
    /// Load the run's state, or the defaults when none was saved yet.
    pub fn load(store: &ArtifactStore, run_id: &str) -> Result<Self, PipeforgeError> {
        let path = store.artifact_path(run_id, Phase::Verification, STATE_FILE);
        let Some(text) = store.read_text(run_id, Phase::Verification, STATE_FILE)? else {
            return Ok(Self::default());
        };
        serde_json::from_str(&text).map_err(|e| PipeforgeError::StateCorrupt {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Persist with an atomic whole-file write.
    pub fn save(&self, store: &ArtifactStore, run_id: &str) -> Result<(), PipeforgeError> {
        store.write_json(run_id, Phase::Verification, STATE_FILE, self)?;
        Ok(())
    }

    #[must_use]
    pub fn should_proceed(&self, fingerprint: &str) -> Decision {
        if self.last_failure_fingerprint.as_deref() != Some(fingerprint) {
            return Decision {
                proceed: true,
                reason: ProceedReason::NewFailurePattern,
                attempts_remaining: MAX_ATTEMPTS,
            };
        }

        if self.attempt_in_spec >= MAX_ATTEMPTS {
            return Decision {
                proceed: false,
                reason: ProceedReason::MaxAttemptsReached,
                attempts_remaining: 0,
            };
        }

        Decision {
            proceed: true,
            reason: ProceedReason::AttemptsRemaining,
            attempts_remaining: MAX_ATTEMPTS - self.attempt_in_spec,
        }
    }

    /// Count one attempt against `fingerprint`.
    ///
    /// A fingerprint different from the last one starts a fresh count at 1.
    pub fn record_attempt(
        &mut self,
        fingerprint: &str,
        issues: &[BlockingIssue],
        timestamp: DateTime<Utc>,
    ) {
        if self.last_failure_fingerprint.as_deref() == Some(fingerprint) {
            self.attempt_in_spec += 1;
        } else {
            self.attempt_in_spec = 1;
            self.last_failure_fingerprint = Some(fingerprint.to_string());
        }

        self.history.push(AttemptRecord {
            attempt: self.attempt_in_spec,
            spec_version: self.spec_version,
            fingerprint: fingerprint.to_string(),
            timestamp,
            issues: issues
                .iter()
                .map(|issue| IssueRef {
                    check: issue.check.clone(),
                    category: issue.category(),
                })
                .collect(),
        });

        tracing::info!(
            fingerprint,
            attempt = self.attempt_in_spec,
            spec_version = self.spec_version,
            "recorded fix attempt"
        );
    }

    /// Human-approved spec change: new version, fresh ceiling.
    pub fn bump_spec_version(&mut self) {
        self.spec_version += 1;
        self.attempt_in_spec = 0;
        self.last_failure_fingerprint = None;
        tracing::info!(spec_version = self.spec_version, "spec version bumped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    const FP: &str = "abc123";

    #[test]
    fn test_defaults() {
        let state = AutoFixState::default();
        assert_eq!(state.spec_version, 1);
        assert_eq!(state.attempt_in_spec, 0);
        assert!(state.last_failure_fingerprint.is_none());
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_ceiling_reached_on_third_cycle() {
        let mut state = AutoFixState::default();
        let mut decisions = Vec::new();

        for _ in 0..3 {
            let decision = state.should_proceed(FP);
            decisions.push(decision);
            if decision.proceed {
                state.record_attempt(FP, &[], Utc::now());
            }
        }

        assert!(decisions[0].proceed);
        assert_eq!(decisions[0].reason, ProceedReason::NewFailurePattern);
        assert!(decisions[1].proceed);
        assert_eq!(decisions[1].reason, ProceedReason::AttemptsRemaining);
        assert_eq!(decisions[1].attempts_remaining, 1);
        assert!(!decisions[2].proceed);
        assert_eq!(decisions[2].reason, ProceedReason::MaxAttemptsReached);
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn test_new_fingerprint_gets_full_ceiling() {
        let mut state = AutoFixState::default();
        state.record_attempt(FP, &[], Utc::now());
        state.record_attempt(FP, &[], Utc::now());
        assert!(!state.should_proceed(FP).proceed);

        let decision = state.should_proceed("other");
        assert!(decision.proceed);
        assert_eq!(decision.attempts_remaining, MAX_ATTEMPTS);

        state.record_attempt("other", &[], Utc::now());
        assert_eq!(state.attempt_in_spec, 1);
        assert!(state.should_proceed("other").proceed);
    }

    #[test]
    fn test_bump_resets_regardless_of_prior_state() {
        let mut state = AutoFixState::default();
        state.record_attempt(FP, &[], Utc::now());
        state.record_attempt(FP, &[], Utc::now());
        state.bump_spec_version();

        assert_eq!(state.spec_version, 2);
        assert_eq!(state.attempt_in_spec, 0);
        assert!(state.last_failure_fingerprint.is_none());
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.should_proceed(FP).reason, ProceedReason::NewFailurePattern);
    }

    #[test]
    fn test_load_save_and_corruption() {
        let temp = TempDir::new().unwrap();
        let store =
            ArtifactStore::new(Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap());
        let run = "20260101_0000_state";
        store.create_run(run).unwrap();

        assert_eq!(AutoFixState::load(&store, run).unwrap(), AutoFixState::default());

        let mut state = AutoFixState::default();
        state.record_attempt(FP, &[], Utc::now());
        state.save(&store, run).unwrap();
        assert_eq!(AutoFixState::load(&store, run).unwrap(), state);

        store
            .write_text(run, Phase::Verification, STATE_FILE, "{broken")
            .unwrap();
        assert!(matches!(
            AutoFixState::load(&store, run),
            Err(PipeforgeError::StateCorrupt { .. })
        ));
    }
}
