//! Console logging setup
//!
//! One `tracing-subscriber` fmt layer writes every line to stdout as
//! `HH:MM:SS LEVEL message`. Colors are only used when stdout is a terminal.

use std::fmt;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, prelude::*};

/// Local wall-clock time, seconds precision
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleTime;

impl FormatTime for ConsoleTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S"))
    }
}

/// Default filter directive for the given verbosity
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Build the filter.
///
/// `--verbose` always wins; otherwise `RUST_LOG` is honored when set.
pub fn build_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(default_filter(true))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(false)))
    }
}

/// Install the process-wide subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(verbose: bool) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_fmt::layer()
                .with_target(false)
                .with_timer(ConsoleTime)
                .with_ansi(atty::is(atty::Stream::Stdout)),
        )
        .with(build_filter(verbose))
        .try_init()
        .is_ok()
}
