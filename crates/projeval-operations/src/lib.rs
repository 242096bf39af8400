//! Instrumented build operations.
//!
//! Every unit of work the lifecycle engine performs is wrapped in an
//! operation: a named, categorized span whose start and completion are
//! reported to a [`TraceSink`]. A completed operation reports either its
//! phase-specific [`OperationResult`] or the failure its body returned, never
//! both.

mod descriptor;
mod runner;
mod sink;
mod trace_file;

pub use descriptor::{
    OperationCategory, OperationDescriptor, OperationDetails, OperationId, OperationResult,
};
pub use runner::{OperationContext, OperationRunner};
pub use sink::{
    FanoutTraceSink, LoggingTraceSink, NoopTraceSink, OperationFinished, OperationOutcome,
    OperationRecord, OperationStarted, RecordingTraceSink, TraceEvent, TraceSink,
};
pub use trace_file::{TRACE_SCHEMA_VERSION, TraceFile, read_trace_file, render_trace, write_trace_file};
