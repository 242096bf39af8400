//! The project configuration lifecycle.
//!
//! [`LifecycleEvaluator::evaluate`] configures a project at most once:
//!
//! 1. `Configure project <path>` wraps everything below.
//! 2. `Execute beforeEvaluate hooks (<path>)` notifies listeners. A failure
//!    here becomes the project's failure and nothing else runs.
//! 3. The delegate [`ProjectEvaluator`] configures the project. A failure is
//!    recorded and the after hooks still run.
//! 4. `Execute afterEvaluate hooks (<path>)` notifies listeners. A failure
//!    becomes the project's failure only if none is recorded yet; otherwise
//!    it is logged and the original failure stands.
//!
//! The recorded failure is returned once the outer operation completes.

use std::time::Instant;

use projeval_operations::{OperationDescriptor, OperationId, OperationResult, OperationRunner};
use projeval_utils::error::ProjectConfigurationError;
use projeval_utils::logging::{log_project_outcome, project_span};
use projeval_utils::types::ShowStacktrace;

use crate::project::Project;
use crate::state::EvaluationState;

/// Performs the actual configuration of a project.
pub trait ProjectEvaluator: Send + Sync {
    fn evaluate(&self, project: &Project, state: &EvaluationState) -> anyhow::Result<()>;
}

impl<F> ProjectEvaluator for F
where
    F: Fn(&Project, &EvaluationState) -> anyhow::Result<()> + Send + Sync,
{
    fn evaluate(&self, project: &Project, state: &EvaluationState) -> anyhow::Result<()> {
        self(project, state)
    }
}

/// What happens to an error raised while notifying after-evaluate listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterEvaluateFailure {
    /// No failure recorded yet: the error becomes the project's failure.
    Record,
    /// A failure is already recorded and must stay the reported one: the
    /// error is only logged.
    LogOnly,
}

impl AfterEvaluateFailure {
    #[must_use]
    pub fn decide(state: &EvaluationState) -> Self {
        if state.has_failure() {
            Self::LogOnly
        } else {
            Self::Record
        }
    }
}

/// Drives a project through its configuration lifecycle.
pub struct LifecycleEvaluator<D> {
    operations: OperationRunner,
    delegate: D,
    show_stacktrace: ShowStacktrace,
}

impl<D: ProjectEvaluator> LifecycleEvaluator<D> {
    #[must_use]
    pub fn new(operations: OperationRunner, delegate: D) -> Self {
        Self {
            operations,
            delegate,
            show_stacktrace: ShowStacktrace::default(),
        }
    }

    /// How much detail to log for after-evaluate errors that are not recorded.
    #[must_use]
    pub fn with_show_stacktrace(mut self, show_stacktrace: ShowStacktrace) -> Self {
        self.show_stacktrace = show_stacktrace;
        self
    }

    #[must_use]
    pub fn operations(&self) -> &OperationRunner {
        &self.operations
    }

    #[must_use]
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Configure `project`, recording the outcome in `state`.
    ///
    /// Does nothing and returns `Ok(())` unless `state` is `NotStarted`.
    /// Otherwise returns the project's recorded failure, if any, after every
    /// phase has run or been skipped.
    pub fn evaluate(
        &self,
        project: &Project,
        state: &mut EvaluationState,
    ) -> Result<(), ProjectConfigurationError> {
        if !state.try_begin_execution() {
            tracing::debug!(
                project = %project.identity(),
                phase = %state.phase(),
                "Project evaluation already started, skipping"
            );
            return Ok(());
        }

        let identity = project.identity();
        let identity_path = identity.identity_path();
        let span = project_span(identity_path.as_str(), identity.build_path.as_str());
        let _entered = span.enter();
        let started = Instant::now();

        let outcome = self
            .operations
            .run(OperationDescriptor::configure_project(identity), |context| {
                self.configure(project, state, context.id());
                state.rethrow()?;
                context.set_result(OperationResult::ConfigureProject);
                Ok::<(), ProjectConfigurationError>(())
            });

        let failure = outcome.as_ref().err().map(ToString::to_string);
        log_project_outcome(identity_path.as_str(), started.elapsed(), failure.as_deref());

        outcome
    }

    fn configure(&self, project: &Project, state: &mut EvaluationState, parent: OperationId) {
        if let Err(e) = self.notify_before_evaluate(project, parent) {
            Self::add_configuration_failure(project, state, e);
            return;
        }

        if let Err(e) = self.delegate.evaluate(project, state) {
            Self::add_configuration_failure(project, state, e);
        }
        state.finish(None);

        if let Err(e) = self.notify_after_evaluate(project, state, parent) {
            self.on_after_evaluate_failure(project, state, e);
        }
    }

    fn notify_before_evaluate(&self, project: &Project, parent: OperationId) -> anyhow::Result<()> {
        let descriptor =
            OperationDescriptor::before_evaluate_hooks(project.identity()).with_parent(parent);
        self.operations.run(descriptor, |context| {
            let listeners_notified = project
                .evaluation_broadcaster()
                .dispatch(|listener| listener.before_evaluate(project))?;
            context.set_result(OperationResult::BeforeEvaluateHooks { listeners_notified });
            Ok::<(), anyhow::Error>(())
        })
    }

    fn notify_after_evaluate(
        &self,
        project: &Project,
        state: &EvaluationState,
        parent: OperationId,
    ) -> anyhow::Result<()> {
        let descriptor =
            OperationDescriptor::after_evaluate_hooks(project.identity()).with_parent(parent);
        self.operations.run(descriptor, |context| {
            let listeners_notified = project
                .evaluation_broadcaster()
                .dispatch(|listener| listener.after_evaluate(project, state))?;
            context.set_result(OperationResult::AfterEvaluateHooks { listeners_notified });
            Ok::<(), anyhow::Error>(())
        })
    }

    fn on_after_evaluate_failure(
        &self,
        project: &Project,
        state: &mut EvaluationState,
        error: anyhow::Error,
    ) {
        match AfterEvaluateFailure::decide(state) {
            AfterEvaluateFailure::Record => Self::add_configuration_failure(project, state, error),
            AfterEvaluateFailure::LogOnly => self.log_secondary_failure(project, &error),
        }
    }

    fn log_secondary_failure(&self, project: &Project, error: &anyhow::Error) {
        let project = project.identity();
        match self.show_stacktrace {
            ShowStacktrace::InternalExceptions => tracing::error!(
                project = %project,
                error = %error,
                "Project evaluation failed including an error in afterEvaluate. \
                 Run with --stacktrace for details of the afterEvaluate error."
            ),
            ShowStacktrace::Always => tracing::error!(
                project = %project,
                error = %format!("{error:#}"),
                "Project evaluation failed including an error in afterEvaluate."
            ),
            ShowStacktrace::AlwaysFull => tracing::error!(
                project = %project,
                error = ?error,
                "Project evaluation failed including an error in afterEvaluate."
            ),
        }
    }

    fn add_configuration_failure(project: &Project, state: &mut EvaluationState, error: anyhow::Error) {
        let failure = ProjectConfigurationError::new(&project.display_name(), error);
        state.finish(Some(failure));
    }
}
