use std::fmt;

use projeval_utils::error::ProjectConfigurationError;

/// Where a project is in its configuration lifecycle. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum EvaluationPhase {
    #[default]
    NotStarted,
    Executing,
    Executed,
}

impl EvaluationPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Executing => "executing",
            Self::Executed => "executed",
        }
    }
}

impl fmt::Display for EvaluationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-project evaluation record: lifecycle phase plus the failure, if any.
///
/// Owned by whoever owns the project and lent mutably to the evaluator for
/// the duration of one evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluationState {
    phase: EvaluationPhase,
    failure: Option<ProjectConfigurationError>,
}

impl EvaluationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> EvaluationPhase {
        self.phase
    }

    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.phase == EvaluationPhase::Executing
    }

    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.phase == EvaluationPhase::Executed
    }

    /// Move from `NotStarted` to `Executing`. Returns false, changing
    /// nothing, in any other phase.
    pub fn try_begin_execution(&mut self) -> bool {
        if self.phase != EvaluationPhase::NotStarted {
            return false;
        }
        self.phase = EvaluationPhase::Executing;
        true
    }

    /// Move to `Executed`, recording `failure` unless one is already recorded.
    pub fn finish(&mut self, failure: Option<ProjectConfigurationError>) {
        self.phase = EvaluationPhase::Executed;
        if self.failure.is_none() {
            self.failure = failure;
        }
    }

    #[must_use]
    pub fn has_failure(&self) -> bool {
        self.failure.is_some()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&ProjectConfigurationError> {
        self.failure.as_ref()
    }

    /// The recorded failure as an error, or `Ok(())`.
    pub fn rethrow(&self) -> Result<(), ProjectConfigurationError> {
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str) -> ProjectConfigurationError {
        ProjectConfigurationError::new("project ':app'", anyhow::anyhow!(message.to_string()))
    }

    #[test]
    fn test_begin_only_from_not_started() {
        let mut state = EvaluationState::new();
        assert_eq!(state.phase(), EvaluationPhase::NotStarted);
        assert!(state.try_begin_execution());
        assert!(state.is_executing());
        assert!(!state.try_begin_execution());

        state.finish(None);
        assert!(state.is_executed());
        assert!(!state.try_begin_execution());
        assert_eq!(state.phase(), EvaluationPhase::Executed);
    }

    #[test]
    fn test_finish_keeps_first_failure() {
        let mut state = EvaluationState::new();
        state.try_begin_execution();
        state.finish(Some(failure("first")));
        state.finish(Some(failure("second")));
        state.finish(None);

        assert!(state.has_failure());
        let recorded = state.failure().unwrap();
        assert_eq!(recorded.cause().to_string(), "first");
        assert_eq!(recorded.to_string(), "A problem occurred configuring project ':app'.");
    }

    #[test]
    fn test_rethrow() {
        let mut state = EvaluationState::new();
        assert!(state.rethrow().is_ok());

        state.finish(Some(failure("boom")));
        let err = state.rethrow().unwrap_err();
        assert_eq!(err.cause().to_string(), "boom");
        // Rethrowing does not consume the failure.
        assert!(state.rethrow().is_err());
    }

    #[test]
    fn test_phase_ordering_and_names() {
        assert!(EvaluationPhase::NotStarted < EvaluationPhase::Executing);
        assert!(EvaluationPhase::Executing < EvaluationPhase::Executed);
        assert_eq!(EvaluationPhase::Executed.to_string(), "executed");
    }
}
