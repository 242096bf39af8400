use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use projeval_utils::logging::{log_operation_failed, log_operation_finished, log_operation_started};

use crate::descriptor::{
    OperationCategory, OperationDescriptor, OperationDetails, OperationId, OperationResult,
};

/// Emitted when an operation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStarted {
    pub id: OperationId,
    pub descriptor: OperationDescriptor,
    pub started_at: DateTime<Utc>,
}

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The body returned `Ok`; `result` is whatever the body set on its context.
    Succeeded { result: Option<OperationResult> },
    /// The body returned `Err`; no result is reported.
    Failed { error: String },
}

/// Emitted when an operation completes, successfully or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFinished {
    pub id: OperationId,
    pub descriptor: OperationDescriptor,
    pub outcome: OperationOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
}

/// Receiver of operation lifecycle events.
///
/// Sinks are shared between threads evaluating different projects; each
/// event is self-contained.
pub trait TraceSink: Send + Sync {
    fn started(&self, event: &OperationStarted);

    fn finished(&self, event: &OperationFinished);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn started(&self, _event: &OperationStarted) {}

    fn finished(&self, _event: &OperationFinished) {}
}

/// Emits operation events as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTraceSink;

impl TraceSink for LoggingTraceSink {
    fn started(&self, event: &OperationStarted) {
        log_operation_started(
            &event.descriptor.display_name,
            event.descriptor.category.as_str(),
        );
    }

    fn finished(&self, event: &OperationFinished) {
        let name = &event.descriptor.display_name;
        let category = event.descriptor.category.as_str();
        match &event.outcome {
            OperationOutcome::Succeeded { .. } => {
                log_operation_finished(name, category, event.duration);
            }
            OperationOutcome::Failed { error } => {
                log_operation_failed(name, category, event.duration, error);
            }
        }
    }
}

/// Forwards every event to each inner sink in order.
#[derive(Default, Clone)]
pub struct FanoutTraceSink {
    sinks: Vec<Arc<dyn TraceSink>>,
}

impl FanoutTraceSink {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn TraceSink>>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl TraceSink for FanoutTraceSink {
    fn started(&self, event: &OperationStarted) {
        for sink in &self.sinks {
            sink.started(event);
        }
    }

    fn finished(&self, event: &OperationFinished) {
        for sink in &self.sinks {
            sink.finished(event);
        }
    }
}

/// A single event as seen by [`RecordingTraceSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Started(OperationStarted),
    Finished(OperationFinished),
}

/// Flattened view of a completed (or still running) operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: OperationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<OperationId>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_display_name: Option<String>,
    pub category: OperationCategory,
    pub details: OperationDetails,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<OperationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl OperationRecord {
    fn from_started(event: &OperationStarted) -> Self {
        let descriptor = &event.descriptor;
        Self {
            id: event.id,
            parent: descriptor.parent,
            display_name: descriptor.display_name.clone(),
            progress_display_name: descriptor.progress_display_name.clone(),
            category: descriptor.category,
            details: descriptor.details.clone(),
            started_at: event.started_at,
            finished_at: None,
            duration_ms: None,
            result: None,
            failure: None,
        }
    }

    fn complete(&mut self, event: &OperationFinished) {
        self.finished_at = Some(event.finished_at);
        self.duration_ms = Some(projeval_utils::logging::duration_ms(event.duration));
        match &event.outcome {
            OperationOutcome::Succeeded { result } => self.result = *result,
            OperationOutcome::Failed { error } => self.failure = Some(error.clone()),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingTraceSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingTraceSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.lock().clone()
    }

    /// Finish events in completion order.
    #[must_use]
    pub fn finished_events(&self) -> Vec<OperationFinished> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Finished(finished) => Some(finished.clone()),
                TraceEvent::Started(_) => None,
            })
            .collect()
    }

    /// Categories of started operations, in start order.
    #[must_use]
    pub fn started_categories(&self) -> Vec<OperationCategory> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Started(started) => Some(started.descriptor.category),
                TraceEvent::Finished(_) => None,
            })
            .collect()
    }

    /// Results of successful operations, in completion order.
    #[must_use]
    pub fn results(&self) -> Vec<OperationResult> {
        self.finished_events()
            .into_iter()
            .filter_map(|finished| match finished.outcome {
                OperationOutcome::Succeeded { result } => result,
                OperationOutcome::Failed { .. } => None,
            })
            .collect()
    }

    /// One record per operation, in start order.
    #[must_use]
    pub fn records(&self) -> Vec<OperationRecord> {
        let events = self.lock();
        let mut records: Vec<OperationRecord> = Vec::new();
        for event in events.iter() {
            match event {
                TraceEvent::Started(started) => records.push(OperationRecord::from_started(started)),
                TraceEvent::Finished(finished) => {
                    if let Some(record) = records.iter_mut().find(|r| r.id == finished.id) {
                        record.complete(finished);
                    }
                }
            }
        }
        records
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl TraceSink for RecordingTraceSink {
    fn started(&self, event: &OperationStarted) {
        self.lock().push(TraceEvent::Started(event.clone()));
    }

    fn finished(&self, event: &OperationFinished) {
        self.lock().push(TraceEvent::Finished(event.clone()));
    }
}
