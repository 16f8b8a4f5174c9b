use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use pipeforge_utils::paths::WorkspaceConfig;
use pipeforge_utils::types::ConfigSource;

mod builder;
mod discovery;
mod validation;

pub use builder::ConfigBuilder;

/// Default per-command timeout for verification commands and installs
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 60;

/// Default number of verify attempts made by `loop`
pub const DEFAULT_MAX_LOOP_ATTEMPTS: u32 = 3;

/// Default runs directory, relative to the workspace root
pub const DEFAULT_RUNS_DIR: &str = "runs";

/// Resolved configuration for one pipeforge invocation.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// runs_dir = "runs"
/// command_timeout_secs = 60
/// max_loop_attempts = 3
/// package_manager = "pnpm"
/// verbose = false
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub workspace: WorkspaceConfig,
    /// Config file that was loaded, if any
    pub config_path: Option<PathBuf>,
    /// Source of each resolved key
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[defaults]` section; every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub runs_dir: Option<String>,
    pub command_timeout_secs: Option<u64>,
    pub max_loop_attempts: Option<u32>,
    pub package_manager: Option<String>,
    pub verbose: Option<bool>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub runs_dir: Option<String>,
    pub command_timeout_secs: Option<u64>,
    pub max_loop_attempts: Option<u32>,
    pub package_manager: Option<String>,
    pub verbose: Option<bool>,
}

/// Package managers the Fixer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Pip,
}

impl PackageManager {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Pip => "pip",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "npm" => Ok(Self::Npm),
            "pnpm" => Ok(Self::Pnpm),
            "yarn" => Ok(Self::Yarn),
            "pip" | "pip3" => Ok(Self::Pip),
            other => Err(format!(
                "unknown package manager '{other}' (expected npm, pnpm, yarn or pip)"
            )),
        }
    }
}

impl Config {
    /// Directory holding all runs.
    #[must_use]
    pub fn runs_root(&self) -> Utf8PathBuf {
        let runs_dir = self.defaults.runs_dir.as_deref().unwrap_or(DEFAULT_RUNS_DIR);
        self.workspace.resolve(camino::Utf8Path::new(runs_dir))
    }

    /// Timeout applied to every verification command and install.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(
            self.defaults
                .command_timeout_secs
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn max_loop_attempts(&self) -> u32 {
        self.defaults
            .max_loop_attempts
            .unwrap_or(DEFAULT_MAX_LOOP_ATTEMPTS)
    }

    /// Configured package manager override. Validation guarantees it parses.
    #[must_use]
    pub fn package_manager(&self) -> Option<PackageManager> {
        self.defaults
            .package_manager
            .as_deref()
            .and_then(|pm| pm.parse().ok())
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    /// Source of a resolved key, `Defaults` when never overridden.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .cloned()
            .unwrap_or(ConfigSource::Defaults)
    }
}
