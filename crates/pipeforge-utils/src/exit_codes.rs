//! Exit code constants for pipeforge.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Verification passed / command completed |
//! | 1 | `FAILURE` | Verification failed, loop exhausted, or `fix` runtime error |
//! | 2 | `RUNTIME_ERROR` | Missing run, missing or malformed DoD, bad arguments |

/// Type-safe process exit code.
///
/// ```rust
/// use pipeforge_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(2), ExitCode::RUNTIME_ERROR);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - verification passed or the command completed
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Failure - a gate failed, the loop ran out of attempts, or `fix` hit a runtime error
    pub const FAILURE: ExitCode = ExitCode(1);

    /// Runtime error - run or DoD missing, DoD unparseable, invalid configuration
    pub const RUNTIME_ERROR: ExitCode = ExitCode(2);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
