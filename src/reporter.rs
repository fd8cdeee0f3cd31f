//! Reporting sink for validation progress and errors
//!
//! Components never log through a global; they receive a `&dyn Reporter`
//! constructed once in `main`. The production sink forwards to `tracing`,
//! tests substitute a recording or mocked implementation.

/// Destination for every line the tool reports
#[cfg_attr(test, mockall::automock)]
pub trait Reporter {
    /// Informational progress line
    fn info(&self, message: &str);

    /// Error line: schema violations, batch-fatal failures, usage text
    fn error(&self, message: &str);

    /// Diagnostic line, only shown in verbose mode
    fn debug(&self, message: &str);
}

/// Reporter writing through the `tracing` subscriber installed by
/// [`crate::logging::init_logging`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}
