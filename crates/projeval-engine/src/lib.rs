//! Project configuration lifecycle engine.
//!
//! A [`Project`] owns its evaluation listeners. A [`LifecycleEvaluator`]
//! drives one project through before-evaluate hooks, the delegated
//! [`ProjectEvaluator`] and after-evaluate hooks, recording the outcome in
//! the project's [`EvaluationState`]. A [`ProjectRegistry`] owns the
//! projects of a build and configures them serially or in parallel.

mod command;
mod evaluator;
mod project;
mod registry;
mod state;

pub use command::{CommandEvaluator, CommandHookListener};
pub use evaluator::{AfterEvaluateFailure, LifecycleEvaluator, ProjectEvaluator};
pub use project::{EvaluationBroadcaster, Project, ProjectEvaluationListener};
pub use registry::{BuildConfigurationReport, ProjectOutcome, ProjectRegistry};
pub use state::{EvaluationPhase, EvaluationState};
