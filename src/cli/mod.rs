//! Command-line interface for pipeforge
//!
//! - `args`: clap argument definitions
//! - `run`: entry point, config discovery, dispatch and error output
//! - `commands`: one module per subcommand

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands};
pub use run::run;
