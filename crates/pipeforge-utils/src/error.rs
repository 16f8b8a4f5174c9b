use std::fmt;
use std::io;
use thiserror::Error;

pub use pipeforge_runner::RunnerError;

/// Library-level error type for pipeforge operations.
///
/// These are the *runtime* failures of the verify/fix/loop core: a run that
/// does not exist, a Definition of Done that is missing or malformed, a
/// corrupt AutoFix state file. Gate failures and failing commands are not
/// errors; they are recorded in the verification report.
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | every `PipeforgeError` raised by `verify` and `loop` |
///
/// The `fix` command reports runtime errors with exit code 1; the mapping is
/// applied by the CLI, library code never calls `std::process::exit()`.
#[derive(Error, Debug)]
pub enum PipeforgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Run error: {0}")]
    Run(#[from] RunError),

    #[error("Definition of Done error: {0}")]
    Dod(#[from] DodError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("AutoFix state at {path} is corrupt: {reason}")]
    StateCorrupt { path: String, reason: String },

    #[error("Artifact write failed at {path}: {reason}")]
    ArtifactWriteFailed { path: String, reason: String },
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Run,
    DefinitionOfDone,
    ProcessExecution,
    FileSystem,
    State,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Run => write!(f, "Run"),
            Self::DefinitionOfDone => write!(f, "Definition of Done"),
            Self::ProcessExecution => write!(f, "Process Execution"),
            Self::FileSystem => write!(f, "File System"),
            Self::State => write!(f, "AutoFix State"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

/// Run lookup and creation errors
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Run '{run_id}' not found at {path}")]
    NotFound { run_id: String, path: String },

    #[error("Run '{run_id}' already exists")]
    AlreadyExists { run_id: String },

    #[error("Invalid run id '{run_id}': {reason}")]
    InvalidId { run_id: String, reason: String },

    #[error("No run id given: pass --run-id or set RUN_ID")]
    Missing,
}

/// Definition of Done loading and parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DodError {
    #[error("Definition of Done not found at {path}")]
    NotFound { path: String },

    #[error("Definition of Done has no front matter block")]
    MissingFrontMatter,

    #[error("Front matter block opened on line 1 is never closed")]
    UnterminatedFrontMatter,

    #[error("Malformed front matter on line {line_no}: '{line}'")]
    MalformedLine { line_no: usize, line: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("The configuration file could not be used: {msg}"),
            Self::InvalidValue { key, value } => {
                format!("Configuration value '{key}' is invalid: {value}")
            }
            Self::NotFound { path } => format!("No configuration file exists at {path}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some(
            "Configuration is read from .pipeforge/config.toml, discovered by walking up from the current directory."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .pipeforge/config.toml".to_string(),
                "Only the [defaults] section is recognised".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![format!(
                "Fix '{key}' in the config file or override it with the matching CLI flag"
            )],
            Self::NotFound { .. } => vec![
                "Pass an existing file to --config, or omit it to use discovery".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for RunError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { run_id, .. } => format!("Run '{run_id}' does not exist"),
            Self::AlreadyExists { run_id } => format!("Run '{run_id}' already exists"),
            Self::InvalidId { run_id, reason } => {
                format!("'{run_id}' is not a valid run id: {reason}")
            }
            Self::Missing => "No run id was provided".to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::NotFound { path, .. } => Some(format!("Looked for the run directory at {path}")),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } | Self::Missing => vec![
                "Create a run with 'pipeforge init <description>'".to_string(),
                "Pass --run-id <id> or export RUN_ID".to_string(),
            ],
            Self::AlreadyExists { .. } => {
                vec!["Wait a minute or use a different description".to_string()]
            }
            Self::InvalidId { .. } => vec![
                "Run ids have the form YYYYMMDD_HHMM_<slug>".to_string(),
                "Only ASCII letters, digits, '-' and '_' are allowed".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Run
    }
}

impl UserFriendlyError for DodError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { .. } => "The run has no Definition of Done yet".to_string(),
            _ => format!("The Definition of Done could not be parsed: {self}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::NotFound { path } => Some(format!("Expected file: {path}")),
            _ => Some(
                "The document must start with a '---' delimited front matter block of key: value lines."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => {
                vec!["Complete the spec phase so 40_spec/DEFINITION_OF_DONE.md exists".to_string()]
            }
            Self::MissingFrontMatter | Self::UnterminatedFrontMatter => vec![
                "Add front matter delimited by '---' lines at the top of the document".to_string(),
            ],
            Self::MalformedLine { line_no, .. } => {
                vec![format!("Rewrite line {line_no} as 'key: value' or '- item'")]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::DefinitionOfDone
    }
}

impl UserFriendlyError for PipeforgeError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Run(err) => err.user_message(),
            Self::Dod(err) => err.user_message(),
            Self::Runner(err) => format!("A process could not be executed: {err}"),
            Self::Io(err) => format!("File system operation failed: {err}"),
            Self::StateCorrupt { path, .. } => {
                format!("The AutoFix state file {path} could not be read")
            }
            Self::ArtifactWriteFailed { path, reason } => {
                format!("Failed to save artifact {path}: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Run(err) => err.context(),
            Self::Dod(err) => err.context(),
            Self::StateCorrupt { reason, .. } => Some(reason.clone()),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Run(err) => err.suggestions(),
            Self::Dod(err) => err.suggestions(),
            Self::StateCorrupt { .. } => vec![
                "Inspect or delete 60_verification/autofix_state.json; it is recreated with defaults"
                    .to_string(),
            ],
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Run(_) => ErrorCategory::Run,
            Self::Dod(_) => ErrorCategory::DefinitionOfDone,
            Self::Runner(_) => ErrorCategory::ProcessExecution,
            Self::Io(_) | Self::ArtifactWriteFailed { .. } => ErrorCategory::FileSystem,
            Self::StateCorrupt { .. } => ErrorCategory::State,
        }
    }
}

impl PipeforgeError {
    /// Get a user-friendly error message with context and actionable suggestions.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the exit code used by `verify` and `loop`.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            Self::Config(_) | Self::Run(_) | Self::Dod(_) | Self::StateCorrupt { .. } => {
                ExitCode::RUNTIME_ERROR
            }
            Self::Runner(_) | Self::Io(_) | Self::ArtifactWriteFailed { .. } => {
                ExitCode::RUNTIME_ERROR
            }
        }
    }

    /// Stable machine-readable kind for JSON error output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Run(_) => "run",
            Self::Dod(_) => "dod",
            Self::Runner(_) => "runner",
            Self::Io(_) => "io",
            Self::StateCorrupt { .. } => "state_corrupt",
            Self::ArtifactWriteFailed { .. } => "artifact_write",
        }
    }
}
