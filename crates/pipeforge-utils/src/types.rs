use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Pipeline phases, each owning a fixed subdirectory of a run.
///
/// ```rust
/// use pipeforge_utils::types::Phase;
///
/// assert_eq!(Phase::Verification.dir_name(), "60_verification");
/// assert_eq!(Phase::ALL.len(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intake,
    Research,
    Debate,
    Spec,
    Design,
    Implementation,
    Verification,
    Fix,
    Deploy,
}

impl Phase {
    /// All phases in pipeline order.
    pub const ALL: [Phase; 9] = [
        Phase::Intake,
        Phase::Research,
        Phase::Debate,
        Phase::Spec,
        Phase::Design,
        Phase::Implementation,
        Phase::Verification,
        Phase::Fix,
        Phase::Deploy,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Research => "research",
            Self::Debate => "debate",
            Self::Spec => "spec",
            Self::Design => "design",
            Self::Implementation => "implementation",
            Self::Verification => "verification",
            Self::Fix => "fix",
            Self::Deploy => "deploy",
        }
    }

    /// Directory name under the run root; the numeric prefix keeps listings
    /// in pipeline order.
    #[must_use]
    pub const fn dir_name(&self) -> &'static str {
        match self {
            Self::Intake => "10_intake",
            Self::Research => "20_research",
            Self::Debate => "30_debate",
            Self::Spec => "40_spec",
            Self::Design => "45_design",
            Self::Implementation => "50_implementation",
            Self::Verification => "60_verification",
            Self::Fix => "70_fix",
            Self::Deploy => "80_deploy",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Cli,
    ConfigFile(PathBuf),
    Programmatic,
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Defaults => write!(f, "default"),
        }
    }
}
