//! Workspace root resolution
//!
//! The workspace root is resolved once by the outermost entry point and handed
//! to every component inside a [`WorkspaceConfig`]; nothing below the CLI
//! re-derives it.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::path::Path;

/// Name of the marker directory that identifies a pipeforge workspace
pub const MARKER_DIR: &str = ".pipeforge";

/// Environment variable that pins the workspace root
pub const HOME_ENV: &str = "PIPEFORGE_HOME";

/// Explicit workspace location shared by all components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub root_path: Utf8PathBuf,
}

impl WorkspaceConfig {
    #[must_use]
    pub fn new(root_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    /// Resolve the workspace root starting from `start`.
    ///
    /// `PIPEFORGE_HOME` wins when set. Otherwise the nearest ancestor holding a
    /// `.pipeforge/` directory is used, falling back to `start` itself.
    pub fn discover_from(start: &Path) -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV) {
            let home = Utf8PathBuf::from_path_buf(home.into())
                .map_err(|p| anyhow::anyhow!("{HOME_ENV} is not valid UTF-8: {}", p.display()))?;
            return Ok(Self::new(home));
        }

        let start = Utf8PathBuf::from_path_buf(start.to_path_buf())
            .map_err(|p| anyhow::anyhow!("Working directory is not valid UTF-8: {}", p.display()))?;

        let root = find_marker_root(&start).unwrap_or_else(|| start.clone());
        Ok(Self::new(root))
    }

    /// Resolve the workspace root from the current directory.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&cwd)
    }

    /// Path of the marker directory (may not exist).
    #[must_use]
    pub fn marker_dir(&self) -> Utf8PathBuf {
        self.root_path.join(MARKER_DIR)
    }

    /// Resolve a possibly-relative path against the workspace root.
    #[must_use]
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        }
    }
}

/// Walk upward from `start` looking for a directory containing `.pipeforge/`.
fn find_marker_root(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(MARKER_DIR).is_dir())
        .map(Utf8Path::to_path_buf)
}

/// Create a directory and all parents, ignoring "already exists" races.
pub fn ensure_dir_all(path: &Utf8Path) -> std::io::Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}
