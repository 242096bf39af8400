//! Configure command implementation
//!
//! Handles `projeval configure [PROJECT...]` and its `--json` variant.

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;

use projeval_engine::{BuildConfigurationReport, ProjectRegistry};
use projeval_operations::{
    FanoutTraceSink, LoggingTraceSink, OperationRunner, RecordingTraceSink, TraceSink,
    write_trace_file,
};
use projeval_utils::error::{ProjevalError, TraceError};
use projeval_utils::logging::duration_ms;
use projeval_utils::types::ProjectPath;

use super::json_emit::{ConfigureJsonOutput, emit_jcs};
use crate::Config;

/// Execute the configure command
///
/// Every requested project is configured even when an earlier one fails.
/// The first failure, in project path order, is returned after the summary
/// has been printed. A trace file that cannot be written is reported as the
/// command's error only when every project succeeded; otherwise it is logged
/// and the project failure stands.
pub fn execute_configure_command(config: &Config, selected: &[ProjectPath], json: bool) -> Result<()> {
    let recorder = Arc::new(RecordingTraceSink::new());
    let recording: Arc<dyn TraceSink> = recorder.clone();
    let logging: Arc<dyn TraceSink> = Arc::new(LoggingTraceSink);
    let sink = FanoutTraceSink::new(vec![logging, recording]);

    let registry = ProjectRegistry::from_config(config, OperationRunner::new(Arc::new(sink)))?;
    let report = if selected.is_empty() {
        registry.configure_all(config.parallel())
    } else {
        registry.configure_selected(selected, config.parallel())?
    };

    let trace = write_trace(config, &recorder);
    let trace_path = trace.as_ref().ok().and_then(Option::as_deref);

    if json {
        let output =
            ConfigureJsonOutput::from_report(&report, trace_path.map(ToString::to_string));
        println!("{}", emit_jcs(&output)?);
    } else {
        print_summary(&report, trace_path);
    }

    command_outcome(&report, trace)?;
    Ok(())
}

/// Write the recorded operations to the configured trace file, if any.
fn write_trace(
    config: &Config,
    recorder: &RecordingTraceSink,
) -> Result<Option<Utf8PathBuf>, ProjevalError> {
    let Some(raw) = config.trace_file() else {
        return Ok(None);
    };
    let path = resolve_trace_path(config, raw)?;
    write_trace_file(&path, &recorder.records())?;
    Ok(Some(path))
}

/// The error the command exits with: the first project failure, else the
/// trace write failure.
fn command_outcome(
    report: &BuildConfigurationReport,
    trace: Result<Option<Utf8PathBuf>, ProjevalError>,
) -> Result<(), ProjevalError> {
    let configured = report.rethrow_first().map_err(ProjevalError::from);
    match (configured, trace) {
        (Err(failure), Err(trace_error)) => {
            tracing::error!(error = %trace_error, "Failed to write trace file");
            Err(failure)
        }
        (Err(failure), Ok(_)) => Err(failure),
        (Ok(()), Err(trace_error)) => Err(trace_error),
        (Ok(()), Ok(_)) => Ok(()),
    }
}

/// Relative trace paths are resolved against the build root.
fn resolve_trace_path(config: &Config, raw: &str) -> Result<Utf8PathBuf, ProjevalError> {
    let path = Utf8PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    let Some(root) = &config.root_dir else {
        return Ok(path);
    };
    let root = Utf8PathBuf::from_path_buf(root.clone()).map_err(|root| TraceError::WriteFailed {
        path: raw.to_string(),
        reason: format!("build root {} is not valid UTF-8", root.display()),
    })?;
    Ok(root.join(path))
}

fn print_summary(report: &BuildConfigurationReport, trace_path: Option<&Utf8Path>) {
    println!(
        "Configured {} project(s): {} succeeded, {} failed",
        report.outcomes.len(),
        report.succeeded_count(),
        report.failed_count()
    );
    for outcome in &report.outcomes {
        let path = outcome.identity.identity_path();
        let elapsed = duration_ms(outcome.duration);
        match &outcome.failure {
            None => println!("  ✓ {path} ({elapsed}ms)"),
            Some(failure) => {
                println!("  ✗ {path} ({elapsed}ms)");
                println!("      {failure}");
                for cause in failure.cause_messages() {
                    println!("        > {cause}");
                }
            }
        }
    }
    if let Some(path) = trace_path {
        println!("\n  Trace written to {path}");
    }
}
