use std::fmt;
use std::sync::Arc;

use projeval_hooks::ListenerBroadcaster;
use projeval_utils::types::ProjectIdentity;

use crate::state::EvaluationState;

/// Callbacks around a project's configuration.
///
/// Both methods default to doing nothing. A listener may register further
/// listeners on the project it is called with; they run within the same
/// dispatch.
pub trait ProjectEvaluationListener: Send + Sync {
    fn before_evaluate(&self, _project: &Project) -> anyhow::Result<()> {
        Ok(())
    }

    fn after_evaluate(&self, _project: &Project, _state: &EvaluationState) -> anyhow::Result<()> {
        Ok(())
    }
}

struct BeforeEvaluateAction<F>(F);

impl<F> ProjectEvaluationListener for BeforeEvaluateAction<F>
where
    F: Fn(&Project) -> anyhow::Result<()> + Send + Sync,
{
    fn before_evaluate(&self, project: &Project) -> anyhow::Result<()> {
        (self.0)(project)
    }
}

struct AfterEvaluateAction<F>(F);

impl<F> ProjectEvaluationListener for AfterEvaluateAction<F>
where
    F: Fn(&Project, &EvaluationState) -> anyhow::Result<()> + Send + Sync,
{
    fn after_evaluate(&self, project: &Project, state: &EvaluationState) -> anyhow::Result<()> {
        (self.0)(project, state)
    }
}

/// Listener collection of a project.
pub type EvaluationBroadcaster = ListenerBroadcaster<dyn ProjectEvaluationListener>;

/// A unit of build configuration together with its lifecycle listeners.
pub struct Project {
    identity: ProjectIdentity,
    listeners: EvaluationBroadcaster,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("identity", &self.identity)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Project {
    #[must_use]
    pub fn new(identity: ProjectIdentity) -> Self {
        Self {
            identity,
            listeners: ListenerBroadcaster::new(),
        }
    }

    #[must_use]
    pub fn identity(&self) -> &ProjectIdentity {
        &self.identity
    }

    /// Name used in failure messages, e.g. `project ':app'`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.identity.display_name()
    }

    /// Listeners notified before and after this project is configured.
    #[must_use]
    pub fn evaluation_broadcaster(&self) -> &EvaluationBroadcaster {
        &self.listeners
    }

    pub fn add_evaluation_listener(&self, listener: Arc<dyn ProjectEvaluationListener>) {
        self.listeners.add(listener);
    }

    /// Run `action` before the project is configured.
    pub fn before_evaluate<F>(&self, action: F)
    where
        F: Fn(&Project) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add_evaluation_listener(Arc::new(BeforeEvaluateAction(action)));
    }

    /// Run `action` after the project is configured, even if configuration failed.
    pub fn after_evaluate<F>(&self, action: F)
    where
        F: Fn(&Project, &EvaluationState) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add_evaluation_listener(Arc::new(AfterEvaluateAction(action)));
    }
}
