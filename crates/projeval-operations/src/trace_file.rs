//! Trace file emission.
//!
//! Completed operations are written as one canonical JSON document
//! (RFC 8785 / JCS) so that two runs with the same outcome differ only in
//! timestamps and durations.

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;

use projeval_utils::atomic_write::write_file_atomic;
use projeval_utils::error::TraceError;

use crate::sink::OperationRecord;

pub const TRACE_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFile {
    pub schema_version: String,
    pub emitted_at: DateTime<Utc>,
    pub operations: Vec<OperationRecord>,
}

impl TraceFile {
    #[must_use]
    pub fn new(operations: Vec<OperationRecord>) -> Self {
        Self {
            schema_version: TRACE_SCHEMA_VERSION.to_string(),
            emitted_at: Utc::now(),
            operations,
        }
    }
}

/// Render a trace document as canonical JSON.
pub fn render_trace(trace: &TraceFile) -> Result<String, TraceError> {
    let value = serde_json::to_value(trace).map_err(|e| TraceError::Serialization {
        reason: e.to_string(),
    })?;
    let bytes = serde_json_canonicalizer::to_vec(&value).map_err(|e| TraceError::Serialization {
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| TraceError::Serialization {
        reason: e.to_string(),
    })
}

/// Write `operations` to `path` atomically.
pub fn write_trace_file(path: &Utf8Path, operations: &[OperationRecord]) -> Result<TraceFile, TraceError> {
    let trace = TraceFile::new(operations.to_vec());
    let content = render_trace(&trace)?;

    write_file_atomic(path, &content).map_err(|e| TraceError::WriteFailed {
        path: path.to_string(),
        reason: format!("{e:#}"),
    })?;

    tracing::debug!(path = %path, operations = operations.len(), "Trace file written");
    Ok(trace)
}

pub fn read_trace_file(path: &Utf8Path) -> Result<TraceFile, TraceError> {
    let content = fs::read_to_string(path).map_err(|e| TraceError::ReadFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| TraceError::Serialization {
        reason: e.to_string(),
    })
}
