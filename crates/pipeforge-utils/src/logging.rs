//! Structured logging for pipeforge
//!
//! Log lines go to stderr so `--json` output on stdout stays machine-readable.

use tracing::{Level, span};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `pipeforge=info`, or `pipeforge=debug`
/// with `verbose`.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("pipeforge=debug,info")
            } else {
                EnvFilter::try_new("pipeforge=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Span wrapping one CLI command for a run.
pub fn command_span(run_id: &str, command: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "pipeforge_command",
        run_id = %run_id,
        command = %command,
    )
}
