//! Process execution for verification commands and dependency installs
//!
//! Every process pipeforge starts goes through [`CommandSpec`] and a
//! [`ProcessRunner`]. Commands run synchronously: the caller blocks until the
//! process exits or its timeout elapses, after which the whole process group is
//! killed and [`RunnerError::Timeout`] is returned.

pub mod command_spec;
pub mod error;
pub mod native;
pub mod process;

pub use command_spec::CommandSpec;
pub use error::RunnerError;
pub use native::NativeRunner;
pub use process::{ProcessOutput, ProcessRunner};
