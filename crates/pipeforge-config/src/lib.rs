//! Configuration for pipeforge
//!
//! Precedence is CLI flags > `.pipeforge/config.toml` > built-in defaults.
//! Each resolved value remembers where it came from.

pub mod config;

pub use config::{CliArgs, Config, ConfigBuilder, Defaults, PackageManager};
