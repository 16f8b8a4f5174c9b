//! Artifact store for pipeforge runs
//!
//! Every artifact lives at `<runs_root>/<run_id>/<phase dir>/<filename>`.
//! Writes are whole-file and atomic; reads of absent artifacts return `None`.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;

use pipeforge_utils::atomic_write::write_file_atomic;
use pipeforge_utils::error::{PipeforgeError, RunError};
use pipeforge_utils::paths::ensure_dir_all;
use pipeforge_utils::run_id::validate_run_id;
use pipeforge_utils::types::Phase;

/// Filesystem-backed artifact layout rooted at the runs directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    runs_root: Utf8PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(runs_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            runs_root: runs_root.into(),
        }
    }

    #[must_use]
    pub fn runs_root(&self) -> &Utf8Path {
        &self.runs_root
    }

    #[must_use]
    pub fn run_dir(&self, run_id: &str) -> Utf8PathBuf {
        self.runs_root.join(run_id)
    }

    /// Create a run directory with every phase subdirectory.
    pub fn create_run(&self, run_id: &str) -> Result<Utf8PathBuf, PipeforgeError> {
        validate_run_id(run_id)?;

        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            return Err(RunError::AlreadyExists {
                run_id: run_id.to_string(),
            }
            .into());
        }

        for phase in Phase::ALL {
            ensure_dir_all(&run_dir.join(phase.dir_name()))?;
        }

        tracing::info!(run_id, path = %run_dir, "created run");
        Ok(run_dir)
    }

    #[must_use]
    pub fn run_exists(&self, run_id: &str) -> bool {
        self.run_dir(run_id).is_dir()
    }

    /// Validate `run_id` and make sure its directory exists.
    pub fn require_run(&self, run_id: &str) -> Result<Utf8PathBuf, PipeforgeError> {
        validate_run_id(run_id)?;
        let run_dir = self.run_dir(run_id);
        if !run_dir.is_dir() {
            return Err(RunError::NotFound {
                run_id: run_id.to_string(),
                path: run_dir.to_string(),
            }
            .into());
        }
        Ok(run_dir)
    }

    #[must_use]
    pub fn phase_dir(&self, run_id: &str, phase: Phase) -> Utf8PathBuf {
        self.run_dir(run_id).join(phase.dir_name())
    }

    #[must_use]
    pub fn artifact_path(&self, run_id: &str, phase: Phase, filename: &str) -> Utf8PathBuf {
        self.phase_dir(run_id, phase).join(filename)
    }

    #[must_use]
    pub fn exists(&self, run_id: &str, phase: Phase, filename: &str) -> bool {
        self.artifact_path(run_id, phase, filename).is_file()
    }

    /// Atomically write a text artifact. `filename` may contain `/` to nest
    /// below the phase directory.
    pub fn write_text(
        &self,
        run_id: &str,
        phase: Phase,
        filename: &str,
        content: &str,
    ) -> Result<Utf8PathBuf, PipeforgeError> {
        let path = self.artifact_path(run_id, phase, filename);
        write_at(&path, content)?;
        tracing::debug!(run_id, phase = %phase, path = %path, "wrote artifact");
        Ok(path)
    }

    /// Atomically write a pretty-printed JSON artifact.
    pub fn write_json<T: Serialize>(
        &self,
        run_id: &str,
        phase: Phase,
        filename: &str,
        value: &T,
    ) -> Result<Utf8PathBuf, PipeforgeError> {
        let path = self.artifact_path(run_id, phase, filename);
        let mut json = serde_json::to_string_pretty(value).map_err(|e| {
            PipeforgeError::ArtifactWriteFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;
        json.push('\n');
        write_at(&path, &json)?;
        tracing::debug!(run_id, phase = %phase, path = %path, "wrote json artifact");
        Ok(path)
    }

    pub fn read_text(
        &self,
        run_id: &str,
        phase: Phase,
        filename: &str,
    ) -> Result<Option<String>, PipeforgeError> {
        read_optional(&self.artifact_path(run_id, phase, filename))
    }

    /// Read and deserialize a JSON artifact; malformed content is an error.
    pub fn read_json<T: DeserializeOwned>(
        &self,
        run_id: &str,
        phase: Phase,
        filename: &str,
    ) -> Result<Option<T>, PipeforgeError> {
        let path = self.artifact_path(run_id, phase, filename);
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };
        serde_json::from_str(&content).map(Some).map_err(|e| {
            PipeforgeError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{path}: {e}"),
            ))
        })
    }

    /// Names of all run directories, sorted (which is also chronological).
    pub fn list_runs(&self) -> Result<Vec<String>, PipeforgeError> {
        if !self.runs_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.runs_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && validate_run_id(name).is_ok()
            {
                runs.push(name.to_string());
            }
        }
        runs.sort();
        Ok(runs)
    }
}

fn write_at(path: &Utf8Path, content: &str) -> Result<(), PipeforgeError> {
    write_file_atomic(path, content).map_err(|e| PipeforgeError::ArtifactWriteFailed {
        path: path.to_string(),
        reason: format!("{e:#}"),
    })
}

fn read_optional(path: &Utf8Path) -> Result<Option<String>, PipeforgeError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    const RUN: &str = "20260309_1405_todo-app";

    fn store() -> (TempDir, ArtifactStore) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("runs")).unwrap();
        (temp, ArtifactStore::new(root))
    }

    #[test]
    fn test_create_run_makes_every_phase_dir() {
        let (_temp, store) = store();
        store.create_run(RUN).unwrap();

        for phase in Phase::ALL {
            assert!(store.phase_dir(RUN, phase).is_dir(), "missing {phase}");
        }
        assert!(store.run_exists(RUN));
    }

    #[test]
    fn test_create_run_twice_fails() {
        let (_temp, store) = store();
        store.create_run(RUN).unwrap();
        let err = store.create_run(RUN).unwrap_err();
        assert!(matches!(err, PipeforgeError::Run(RunError::AlreadyExists { .. })));
    }

    #[test]
    fn test_require_run_reports_missing() {
        let (_temp, store) = store();
        let err = store.require_run(RUN).unwrap_err();
        assert!(matches!(err, PipeforgeError::Run(RunError::NotFound { .. })));
    }

    #[test]
    fn test_require_run_rejects_traversal() {
        let (_temp, store) = store();
        assert!(store.require_run("../etc").is_err());
    }

    #[test]
    fn test_text_roundtrip_and_absent_read() {
        let (_temp, store) = store();
        store.create_run(RUN).unwrap();

        assert_eq!(store.read_text(RUN, Phase::Spec, "spec.md").unwrap(), None);
        store.write_text(RUN, Phase::Spec, "spec.md", "# Spec\n").unwrap();
        assert!(store.exists(RUN, Phase::Spec, "spec.md"));
        assert_eq!(
            store.read_text(RUN, Phase::Spec, "spec.md").unwrap().as_deref(),
            Some("# Spec\n")
        );
    }

    #[test]
    fn test_json_write_nests_and_reads_back() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Marker {
            attempt: u32,
        }

        let (_temp, store) = store();
        store.create_run(RUN).unwrap();
        let path = store
            .write_json(RUN, Phase::Fix, "attempt_1/fix_result.json", &Marker { attempt: 1 })
            .unwrap();
        assert!(path.ends_with("70_fix/attempt_1/fix_result.json"));

        let back: Option<Marker> = store
            .read_json(RUN, Phase::Fix, "attempt_1/fix_result.json")
            .unwrap();
        assert_eq!(back, Some(Marker { attempt: 1 }));
    }

    #[test]
    fn test_read_json_malformed_is_error() {
        let (_temp, store) = store();
        store.create_run(RUN).unwrap();
        store.write_text(RUN, Phase::Intake, "intake.json", "{not json").unwrap();
        let result: Result<Option<serde_json::Value>, _> =
            store.read_json(RUN, Phase::Intake, "intake.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_list_runs_sorted_and_filtered() {
        let (_temp, store) = store();
        store.create_run("20260310_0900_b").unwrap();
        store.create_run("20260309_0900_a").unwrap();
        fs::create_dir_all(store.runs_root().join(".hidden")).unwrap();

        assert_eq!(
            store.list_runs().unwrap(),
            vec!["20260309_0900_a".to_string(), "20260310_0900_b".to_string()]
        );
    }
}
