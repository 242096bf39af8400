use chrono::Utc;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::descriptor::{OperationDescriptor, OperationId, OperationResult};
use crate::sink::{NoopTraceSink, OperationFinished, OperationOutcome, OperationStarted, TraceSink};

/// Handle passed to an operation body.
#[derive(Debug)]
pub struct OperationContext {
    id: OperationId,
    result: Option<OperationResult>,
}

impl OperationContext {
    #[must_use]
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Record the success payload. Only reported if the body returns `Ok`.
    pub fn set_result(&mut self, result: OperationResult) {
        self.result = Some(result);
    }
}

/// Runs bodies as instrumented operations against a shared [`TraceSink`].
///
/// Cloning is cheap and clones share the id sequence, so ids stay unique
/// across projects evaluated on different threads.
#[derive(Clone)]
pub struct OperationRunner {
    sink: Arc<dyn TraceSink>,
    next_id: Arc<AtomicU64>,
}

impl Default for OperationRunner {
    fn default() -> Self {
        Self::new(Arc::new(NoopTraceSink))
    }
}

impl std::fmt::Debug for OperationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRunner")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl OperationRunner {
    #[must_use]
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self {
            sink,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    #[must_use]
    pub fn sink(&self) -> &Arc<dyn TraceSink> {
        &self.sink
    }

    /// Run `body` as one operation.
    ///
    /// On `Ok` the sink receives whatever result the body set on its context.
    /// On `Err` the sink receives the rendered error and no result, and the
    /// error is returned unchanged.
    pub fn run<T, E, F>(&self, descriptor: OperationDescriptor, body: F) -> Result<T, E>
    where
        E: Display,
        F: FnOnce(&mut OperationContext) -> Result<T, E>,
    {
        let id = OperationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let started_at = Utc::now();
        let clock = Instant::now();

        self.sink.started(&OperationStarted {
            id,
            descriptor: descriptor.clone(),
            started_at,
        });

        let mut context = OperationContext { id, result: None };
        let outcome = body(&mut context);

        let reported = match &outcome {
            Ok(_) => OperationOutcome::Succeeded {
                result: context.result,
            },
            Err(e) => OperationOutcome::Failed {
                error: format!("{e:#}"),
            },
        };

        self.sink.finished(&OperationFinished {
            id,
            descriptor,
            outcome: reported,
            started_at,
            finished_at: Utc::now(),
            duration: clock.elapsed(),
        });

        outcome
    }
}
