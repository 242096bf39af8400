use serde::Serialize;

use projeval_config::{HookConfig, OnFail};
use projeval_utils::error::HookError;

use crate::executor::{CommandExecutor, HookContext, HookResult};

/// Warning recorded for a failed hook configured with `on_fail = "warn"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookWarning {
    pub hook_type: String,
    pub project_path: String,
    pub command: String,
    /// Exit code or -1 for timeout
    pub exit_code: i32,
    pub timed_out: bool,
    pub stderr: String,
}

impl HookWarning {
    #[must_use]
    pub fn from_result(context: &HookContext, command: &str, result: &HookResult) -> Self {
        Self {
            hook_type: context.hook_type.clone(),
            project_path: context.project_path.clone(),
            command: command.to_string(),
            exit_code: result.exit_code,
            timed_out: result.timed_out,
            stderr: result.stderr.clone(),
        }
    }

    #[must_use]
    pub fn to_warning_string(&self) -> String {
        if self.timed_out {
            format!(
                "hook_timeout:{}:{}:{}",
                self.hook_type, self.project_path, self.command
            )
        } else {
            format!(
                "hook_failed:{}:{}:{}:exit_code={}",
                self.hook_type, self.project_path, self.command, self.exit_code
            )
        }
    }
}

/// Outcome of a hook with its `on_fail` policy applied
#[derive(Debug, Clone)]
pub enum HookOutcome {
    Success(HookResult),
    /// Failed with `on_fail = "warn"`; the project continues
    Warning {
        result: HookResult,
        warning: HookWarning,
    },
    /// Failed with `on_fail = "fail"`; the error becomes a listener failure
    Failure { result: HookResult, error: HookError },
}

impl HookOutcome {
    #[must_use]
    pub fn should_continue(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Warning { .. })
    }

    #[must_use]
    pub fn warning(&self) -> Option<&HookWarning> {
        match self {
            Self::Warning { warning, .. } => Some(warning),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&HookError> {
        match self {
            Self::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    #[must_use]
    pub fn result(&self) -> &HookResult {
        match self {
            Self::Success(result) | Self::Warning { result, .. } | Self::Failure { result, .. } => {
                result
            }
        }
    }

    /// `Ok` unless the hook failed with `on_fail = "fail"`.
    pub fn into_result(self) -> Result<HookResult, HookError> {
        match self {
            Self::Success(result) | Self::Warning { result, .. } => Ok(result),
            Self::Failure { error, .. } => Err(error),
        }
    }
}

/// Apply the hook's `on_fail` policy to a finished run.
#[must_use]
pub fn process_hook_result(
    result: HookResult,
    config: &HookConfig,
    context: &HookContext,
) -> HookOutcome {
    if result.success {
        return HookOutcome::Success(result);
    }

    let warning = HookWarning::from_result(context, &config.command, &result);

    match config.on_fail {
        OnFail::Warn => {
            tracing::warn!(
                hook_type = %context.hook_type,
                project = %context.project_path,
                command = %config.command,
                exit_code = result.exit_code,
                timed_out = result.timed_out,
                "Hook failed but on_fail=warn, continuing"
            );
            HookOutcome::Warning { result, warning }
        }
        OnFail::Fail => {
            let error = if result.timed_out {
                HookError::Timeout {
                    command: config.command.clone(),
                    timeout_seconds: config.timeout,
                }
            } else {
                HookError::ExecutionFailed {
                    command: config.command.clone(),
                    code: result.exit_code,
                    stderr: result.stderr.clone(),
                }
            };

            tracing::debug!(
                hook_type = %context.hook_type,
                project = %context.project_path,
                command = %config.command,
                exit_code = result.exit_code,
                timed_out = result.timed_out,
                "Hook failed with on_fail=fail"
            );

            HookOutcome::Failure { result, error }
        }
    }
}

/// Run a hook and apply its `on_fail` policy.
pub fn execute_and_process_hook(
    executor: &CommandExecutor,
    config: &HookConfig,
    context: &HookContext,
) -> Result<HookOutcome, HookError> {
    let result = executor.execute_blocking(&config.command, config.timeout, context)?;
    tracing::debug!(
        hook_type = %context.hook_type,
        project = %context.project_path,
        command = %config.command,
        duration_ms = result.duration_ms,
        "Hook finished"
    );
    Ok(process_hook_result(result, config, context))
}
