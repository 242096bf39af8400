//! projeval - project configuration lifecycle engine
//!
//! projeval configures the projects of a build one at a time, wrapping each
//! project's configuration in before-evaluate and after-evaluate hooks and
//! reporting every step as an instrumented operation.
//!
//! projeval can be used in two ways:
//! - **CLI**: run `projeval configure` in a directory with a `.projeval/config.toml`
//! - **Library**: build [`Project`]s, attach listeners and drive them with a
//!   [`LifecycleEvaluator`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Configure every project, writing a canonical JSON trace
//! projeval configure --trace-file build/trace.json
//!
//! # Configure selected projects one after another
//! projeval configure :app :lib --serial
//!
//! # Show configured projects and the effective configuration
//! projeval projects --json
//! projeval config
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust
//! use projeval::{EvaluationState, LifecycleEvaluator, OperationRunner, Project};
//! use projeval::types::{ProjectIdentity, ProjectPath};
//!
//! let project = Project::new(ProjectIdentity::new(
//!     ProjectPath::root(),
//!     ":app".parse().unwrap(),
//!     "acme",
//! ));
//! project.after_evaluate(|project, state| {
//!     println!("{} finished in phase {}", project.identity(), state.phase());
//!     Ok(())
//! });
//!
//! let evaluator = LifecycleEvaluator::new(
//!     OperationRunner::default(),
//!     |_: &Project, _: &EvaluationState| -> anyhow::Result<()> { Ok(()) },
//! );
//! let mut state = EvaluationState::new();
//! evaluator.evaluate(&project, &mut state).unwrap();
//! assert!(state.is_executed());
//! ```
//!
//! # JSON Contracts
//!
//! `configure --json`, `projects --json`, `config --json` and trace files are
//! emitted in JCS (RFC 8785) canonical form.

pub mod cli;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration with discovery and precedence: CLI > config file > defaults.
pub use projeval_config::Config;

/// Builder for programmatic configuration.
pub use projeval_config::ConfigBuilder;

/// Command-line overrides applied on top of the configuration file.
pub use projeval_config::CliArgs;

pub use projeval_config::{HookConfig, HookEvent, OnFail, ProjectConfig};

// ============================================================================
// Engine
// ============================================================================

pub use projeval_engine::{
    AfterEvaluateFailure, BuildConfigurationReport, CommandEvaluator, CommandHookListener,
    EvaluationPhase, EvaluationState, LifecycleEvaluator, Project, ProjectEvaluationListener,
    ProjectEvaluator, ProjectOutcome, ProjectRegistry,
};

pub use projeval_operations::{
    FanoutTraceSink, LoggingTraceSink, OperationCategory, OperationRecord, OperationResult,
    OperationRunner, RecordingTraceSink, TraceSink, write_trace_file,
};

// ============================================================================
// Errors and exit codes
// ============================================================================

/// Library error type.
pub use projeval_utils::error::ProjevalError;

/// The failure recorded for a project's configuration.
pub use projeval_utils::error::ProjectConfigurationError;

/// Error categories for grouping similar errors.
pub use projeval_utils::error::ErrorCategory;

/// User-facing error reporting with context and suggestions.
pub use projeval_utils::error::UserFriendlyError;

/// CLI exit codes.
pub use projeval_utils::exit_codes::ExitCode;

// ============================================================================
// Module re-exports (not covered by semver)
// ============================================================================

#[doc(hidden)]
#[cfg(any(test, feature = "test-utils"))]
pub use projeval_utils::test_support;

#[doc(hidden)]
pub use projeval_config as config;
#[doc(hidden)]
pub use projeval_engine as engine;
#[doc(hidden)]
pub use projeval_hooks as hooks;
#[doc(hidden)]
pub use projeval_operations as operations;
#[doc(hidden)]
pub use projeval_utils::{error, exit_codes, logging, types};
