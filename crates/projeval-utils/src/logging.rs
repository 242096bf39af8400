//! Logging and observability infrastructure for projeval
//!
//! Structured logging on `tracing`: every event emitted while configuring a
//! project carries the project identity path, and operation events carry the
//! operation category and duration.

use std::io::IsTerminal;
use std::time::Duration;
use tracing::{Level, debug, info, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Default filter directive for the given verbosity.
#[must_use]
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "projeval=debug,info"
    } else {
        "projeval=info,warn"
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity-derived default filter.
/// Verbose mode keeps targets and emits span close events with timings.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .without_time()
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering the configuration of one project.
pub fn project_span(identity_path: &str, build_path: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "configure_project",
        project = %identity_path,
        build = %build_path,
    )
}

pub fn log_operation_started(operation: &str, category: &str) {
    debug!(operation = %operation, category = %category, "Operation started");
}

pub fn log_operation_finished(operation: &str, category: &str, duration: Duration) {
    debug!(
        operation = %operation,
        category = %category,
        duration_ms = duration_ms(duration),
        "Operation finished"
    );
}

pub fn log_operation_failed(operation: &str, category: &str, duration: Duration, error: &str) {
    warn!(
        operation = %operation,
        category = %category,
        duration_ms = duration_ms(duration),
        error = %error,
        "Operation failed"
    );
}

/// Log the outcome of a whole project evaluation.
pub fn log_project_outcome(identity_path: &str, duration: Duration, failure: Option<&str>) {
    match failure {
        None => info!(
            project = %identity_path,
            duration_ms = duration_ms(duration),
            "Project configured"
        ),
        Some(error) => warn!(
            project = %identity_path,
            duration_ms = duration_ms(duration),
            error = %error,
            "Project configuration failed"
        ),
    }
}

/// Milliseconds as `u64`, saturating for absurdly long durations.
#[must_use]
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
