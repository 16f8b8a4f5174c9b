//! CLI command implementations.
//!
//! Every handler returns the process exit code for a completed command;
//! errors are printed by `run`.

mod common;
mod fix;
mod init;
mod loop_cmd;
mod status;
mod verify;

pub use fix::execute_fix_command;
pub use init::execute_init_command;
pub use loop_cmd::execute_loop_command;
pub use status::execute_status_command;
pub use verify::execute_verify_command;
