use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `ProjevalError` is the umbrella error returned by projeval library
/// operations outside the evaluation engine itself. It provides:
/// - Detailed error information for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes for consistent error reporting
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors, unknown projects |
/// | 3 | Project configuration failed |
/// | 1 | Other errors |
///
/// Library code returns `ProjevalError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum ProjevalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    ProjectConfiguration(#[from] ProjectConfigurationError),

    #[error("Trace output error: {0}")]
    Trace(#[from] TraceError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown project: {path}")]
    UnknownProject { path: String },
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ProjectEvaluation,
    Hooks,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::ProjectEvaluation => write!(f, "Project Evaluation"),
            Self::Hooks => write!(f, "Hooks"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid project path '{path}': {reason}")]
    InvalidProjectPath { path: String, reason: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration validation failed: {error_count} errors")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::InvalidProjectPath { path, reason } => {
                format!("'{path}' is not a valid project path ({reason})")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            Self::ValidationFailed { errors, .. } => {
                format!(
                    "Configuration validation failed with {} errors: {}",
                    errors.len(),
                    errors.join(", ")
                )
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [defaults], [build], [projects] and [hooks] sections."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::InvalidProjectPath { .. } => Some(
                "Project paths are colon separated and absolute, for example ':' or ':libs:core'."
                    .to_string(),
            ),
            Self::NotFound { .. } => Some(
                "projeval searches for .projeval/config.toml starting from the current directory upward."
                    .to_string(),
            ),
            Self::ValidationFailed { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Quote project paths used as table keys, e.g. [projects.\":app\"]".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "show_stacktrace" => vec![
                    "Use one of: internal-exceptions, always, always-full".to_string(),
                ],
                "timeout" => vec!["Use a positive number of seconds".to_string()],
                _ => vec!["Check the documentation for valid values".to_string()],
            },
            Self::InvalidProjectPath { .. } => vec![
                "Start the path with ':'".to_string(),
                "Remove empty segments and whitespace".to_string(),
            ],
            Self::NotFound { path } => vec![
                format!("Create the configuration file at {path}"),
                "Run without --config to use discovery".to_string(),
            ],
            Self::ValidationFailed { errors, .. } => errors
                .iter()
                .map(|e| format!("Fix: {e}"))
                .collect(),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// The authoritative failure recorded for a project's evaluation attempt.
///
/// The cause is shared, so the error can be stored in the project's state and
/// handed to callers at the same time.
#[derive(Debug, Clone)]
pub struct ProjectConfigurationError {
    message: String,
    cause: Arc<anyhow::Error>,
}

impl ProjectConfigurationError {
    #[must_use]
    pub fn new(display_name: &str, cause: anyhow::Error) -> Self {
        Self {
            message: format!("A problem occurred configuring {display_name}."),
            cause: Arc::new(cause),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error raised by the hook or evaluator.
    #[must_use]
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Messages of the cause chain, outermost first.
    #[must_use]
    pub fn cause_messages(&self) -> Vec<String> {
        self.cause.chain().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ProjectConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProjectConfigurationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + 'static) = (*self.cause).as_ref();
        Some(cause)
    }
}

impl UserFriendlyError for ProjectConfigurationError {
    fn user_message(&self) -> String {
        self.message.clone()
    }

    fn context(&self) -> Option<String> {
        let causes = self.cause_messages();
        if causes.is_empty() {
            None
        } else {
            Some(causes.join("\n  > "))
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec![
            "Run with --stacktrace to log secondary afterEvaluate failures in full".to_string(),
            "Run with --verbose for per-operation timing and hook output".to_string(),
        ]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::ProjectEvaluation
    }
}

/// Error type for command hook execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("Hook command failed with exit code {code}: {command}")]
    ExecutionFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Hook timed out after {timeout_seconds} seconds: {command}")]
    Timeout {
        command: String,
        timeout_seconds: u64,
    },

    #[error("Hook command not found: {command}")]
    CommandNotFound { command: String },

    #[error("Hook spawn failed: {reason}")]
    SpawnFailed { reason: String },

    #[error("Hook IO error: {reason}")]
    IoError { reason: String },
}

impl UserFriendlyError for HookError {
    fn user_message(&self) -> String {
        match self {
            Self::ExecutionFailed { command, code, .. } => {
                format!("Command '{command}' exited with code {code}")
            }
            Self::Timeout {
                command,
                timeout_seconds,
            } => format!("Command '{command}' did not finish within {timeout_seconds}s"),
            Self::CommandNotFound { command } => format!("Command '{command}' was not found"),
            Self::SpawnFailed { reason } => format!("Could not start command: {reason}"),
            Self::IoError { reason } => format!("I/O failure while running command: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ExecutionFailed { stderr, .. } if !stderr.trim().is_empty() => {
                Some(format!("stderr: {}", stderr.trim()))
            }
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Timeout { .. } => vec!["Increase the timeout for this command".to_string()],
            Self::CommandNotFound { .. } | Self::SpawnFailed { .. } => vec![
                "Check that the command exists and is executable".to_string(),
            ],
            _ => vec!["Run the command manually to reproduce the failure".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Hooks
    }
}

/// Errors writing trace output
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("Failed to serialize trace records: {reason}")]
    Serialization { reason: String },

    #[error("Failed to write trace file at {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to read trace file at {path}: {reason}")]
    ReadFailed { path: String, reason: String },
}

impl UserFriendlyError for ProjevalError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::ProjectConfiguration(err) => err.user_message(),
            Self::Trace(err) => err.to_string(),
            Self::Io(err) => format!("File system operation failed: {err}"),
            Self::UnknownProject { path } => format!("No project is configured at '{path}'"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::ProjectConfiguration(err) => err.context(),
            Self::Trace(_) | Self::Io(_) => None,
            Self::UnknownProject { .. } => {
                Some("Projects are declared in the [projects] section of the configuration.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::ProjectConfiguration(err) => err.suggestions(),
            Self::Trace(_) => vec!["Check that the trace file directory is writable".to_string()],
            Self::Io(_) => vec!["Check file permissions and available disk space".to_string()],
            Self::UnknownProject { .. } => {
                vec!["Run 'projeval projects' to list configured projects".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::UnknownProject { .. } => ErrorCategory::Configuration,
            Self::ProjectConfiguration(_) => ErrorCategory::ProjectEvaluation,
            Self::Trace(_) | Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl ProjevalError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    ///
    /// # Example
    ///
    /// ```rust
    /// use projeval_utils::error::{ProjevalError, ConfigError};
    ///
    /// let err = ProjevalError::Config(ConfigError::InvalidFile("bad toml".to_string()));
    /// let message = err.display_for_user();
    /// assert!(message.starts_with("Error: "));
    /// assert!(message.contains("Suggestions:"));
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            Self::Config(_) | Self::UnknownProject { .. } => ExitCode::CLI_ARGS,
            Self::ProjectConfiguration(_) => ExitCode::CONFIGURATION_FAILED,
            Self::Trace(_) | Self::Io(_) => ExitCode::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::ExitCode;
    use anyhow::anyhow;
    use std::error::Error as _;

    #[test]
    fn test_project_configuration_error_message() {
        let err = ProjectConfigurationError::new("project ':app'", anyhow!("boom"));
        assert_eq!(err.to_string(), "A problem occurred configuring project ':app'.");
        assert_eq!(err.message(), "A problem occurred configuring project ':app'.");
        assert_eq!(err.cause().to_string(), "boom");
    }

    #[test]
    fn test_project_configuration_error_exposes_source() {
        let cause = anyhow!("root cause").context("while applying script");
        let err = ProjectConfigurationError::new("project ':lib'", cause);

        let source = err.source().expect("cause should be exposed as source");
        assert_eq!(source.to_string(), "while applying script");
        assert_eq!(
            err.cause_messages(),
            vec!["while applying script".to_string(), "root cause".to_string()]
        );
    }

    #[test]
    fn test_project_configuration_error_clones_share_cause() {
        let err = ProjectConfigurationError::new("project ':a'", anyhow!("shared"));
        let clone = err.clone();
        assert!(std::ptr::eq(err.cause(), clone.cause()));
    }

    #[test]
    fn test_display_for_user_includes_cause_chain() {
        let err: ProjevalError = ProjectConfigurationError::new(
            "project ':app'",
            anyhow!("script failed").context("evaluating build script"),
        )
        .into();
        let rendered = err.display_for_user();
        assert!(rendered.starts_with("Error: A problem occurred configuring project ':app'."));
        assert!(rendered.contains("evaluating build script"));
        assert!(rendered.contains("script failed"));
        assert!(rendered.contains("--stacktrace"));
    }

    #[test]
    fn test_exit_code_mapping() {
        let config = ProjevalError::Config(ConfigError::InvalidFile("x".to_string()));
        assert_eq!(config.to_exit_code(), ExitCode::CLI_ARGS);

        let unknown = ProjevalError::UnknownProject {
            path: ":nope".to_string(),
        };
        assert_eq!(unknown.to_exit_code(), ExitCode::CLI_ARGS);

        let failed: ProjevalError =
            ProjectConfigurationError::new("project ':a'", anyhow!("x")).into();
        assert_eq!(failed.to_exit_code(), ExitCode::CONFIGURATION_FAILED);

        // Hook errors reach the user as the cause of a project failure.
        let hook: ProjevalError = ProjectConfigurationError::new(
            "project ':a'",
            HookError::SpawnFailed {
                reason: "denied".to_string(),
            }
            .into(),
        )
        .into();
        assert_eq!(hook.to_exit_code(), ExitCode::CONFIGURATION_FAILED);

        let io = ProjevalError::Io(io::Error::other("disk"));
        assert_eq!(io.to_exit_code(), ExitCode::INTERNAL);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ConfigError::InvalidFile(String::new()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            HookError::CommandNotFound {
                command: "x".to_string()
            }
            .category(),
            ErrorCategory::Hooks
        );
        assert_eq!(ErrorCategory::ProjectEvaluation.to_string(), "Project Evaluation");
    }

    #[test]
    fn test_hook_error_context_shows_stderr() {
        let err = HookError::ExecutionFailed {
            command: "./check.sh".to_string(),
            code: 2,
            stderr: "missing toolchain\n".to_string(),
        };
        assert_eq!(err.context().as_deref(), Some("stderr: missing toolchain"));
        assert!(err.user_message().contains("exited with code 2"));
    }
}
