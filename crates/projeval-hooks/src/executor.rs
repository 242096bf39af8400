//! Shell command execution for hooks and configure commands.
//!
//! Commands run through the platform shell (`sh -c` / `cmd /C`) in the build
//! root directory and receive their context via environment variables and a
//! JSON document on stdin:
//!
//! - `PROJEVAL_PROJECT_PATH`: identity path of the project (e.g. `:app`)
//! - `PROJEVAL_BUILD_PATH`: identity path of the owning build
//! - `PROJEVAL_HOOK_TYPE`: `before_evaluate`, `after_evaluate` or `configure`
//! - `PROJEVAL_PROJECT_FAILED`: `true` when the project already has a failure

use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use projeval_config::HookEvent;
use projeval_utils::error::HookError;
use projeval_utils::logging::duration_ms;
use projeval_utils::types::ProjectIdentity;

/// Output kept from a command's stdout and stderr.
const MAX_OUTPUT_BYTES: usize = 2048;

/// What a command is being run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    Event(HookEvent),
    Configure,
}

impl HookType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event(event) => event.as_str(),
            Self::Configure => "configure",
        }
    }
}

impl std::fmt::Display for HookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HookEvent> for HookType {
    fn from(event: HookEvent) -> Self {
        Self::Event(event)
    }
}

/// Context passed to commands via environment variables and stdin
#[derive(Debug, Clone, Serialize)]
pub struct HookContext {
    pub project_path: String,
    pub build_path: String,
    pub project_name: String,
    pub hook_type: String,
    /// Whether the project already has a recorded configuration failure
    pub project_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl HookContext {
    #[must_use]
    pub fn new(identity: &ProjectIdentity, hook_type: HookType) -> Self {
        Self {
            project_path: identity.identity_path().to_string(),
            build_path: identity.build_path.to_string(),
            project_name: identity.name.clone(),
            hook_type: hook_type.to_string(),
            project_failed: false,
            failure: None,
        }
    }

    /// Mark the project as already failed with `message`.
    #[must_use]
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.project_failed = true;
        self.failure = Some(message.into());
        self
    }

    /// Convert to JSON for stdin payload
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Result of running a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookResult {
    pub success: bool,
    /// Exit code (0 = success, -1 = timeout or killed by signal)
    pub exit_code: i32,
    /// Standard output (truncated to 2 KiB)
    pub stdout: String,
    /// Standard error (truncated to 2 KiB)
    pub stderr: String,
    pub timed_out: bool,
    pub duration_ms: u64,
}

impl HookResult {
    #[must_use]
    pub fn success(stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            success: true,
            exit_code: 0,
            stdout,
            stderr,
            timed_out: false,
            duration_ms,
        }
    }

    #[must_use]
    pub fn failure(exit_code: i32, stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            success: false,
            exit_code,
            stdout,
            stderr,
            timed_out: false,
            duration_ms,
        }
    }

    #[must_use]
    pub fn timeout(duration_ms: u64) -> Self {
        Self {
            success: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
            duration_ms,
        }
    }
}

/// Runs shell commands with project context.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    /// Working directory; the current directory when `None`.
    working_dir: Option<PathBuf>,
}

impl CommandExecutor {
    #[must_use]
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self { working_dir }
    }

    /// Run `command` with `context`, killing it after `timeout_secs`.
    ///
    /// A non-zero exit or a timeout is reported in the [`HookResult`]; only
    /// failures to start or wait for the process are errors.
    pub async fn execute(
        &self,
        command: &str,
        timeout_secs: u64,
        context: &HookContext,
    ) -> Result<HookResult, HookError> {
        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        let mut cmd = self.build_command(command, context);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HookError::CommandNotFound {
                    command: command.to_string(),
                }
            } else {
                HookError::SpawnFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = context.to_json().map_err(|e| HookError::IoError {
                reason: format!("Failed to serialize hook context: {e}"),
            })?;

            // Commands are free to ignore stdin and exit before reading it.
            let _ = stdin.write_all(payload.as_bytes()).await;
            let _ = stdin.shutdown().await;
        }

        let waited = tokio::time::timeout(timeout, child.wait_with_output()).await;
        let elapsed = duration_ms(start.elapsed());

        match waited {
            Ok(Ok(output)) => {
                let stdout = truncate_output(&String::from_utf8_lossy(&output.stdout));
                let stderr = truncate_output(&String::from_utf8_lossy(&output.stderr));
                if output.status.success() {
                    Ok(HookResult::success(stdout, stderr, elapsed))
                } else {
                    let exit_code = output.status.code().unwrap_or(-1);
                    Ok(HookResult::failure(exit_code, stdout, stderr, elapsed))
                }
            }
            Ok(Err(e)) => Err(HookError::IoError {
                reason: e.to_string(),
            }),
            // Dropping the wait future drops the child, which kills it.
            Err(_) => Ok(HookResult::timeout(elapsed)),
        }
    }

    /// Blocking variant of [`execute`](Self::execute) for synchronous callers.
    ///
    /// Drives the command on a private current-thread runtime, so it must not
    /// be called from inside an async context.
    pub fn execute_blocking(
        &self,
        command: &str,
        timeout_secs: u64,
        context: &HookContext,
    ) -> Result<HookResult, HookError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HookError::SpawnFailed {
                reason: format!("Failed to start command runtime: {e}"),
            })?;
        runtime.block_on(self.execute(command, timeout_secs, context))
    }

    fn build_command(&self, command: &str, context: &HookContext) -> Command {
        #[cfg(windows)]
        let (shell, shell_arg) = ("cmd", "/C");
        #[cfg(not(windows))]
        let (shell, shell_arg) = ("sh", "-c");

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg).arg(command);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.env("PROJEVAL_PROJECT_PATH", &context.project_path);
        cmd.env("PROJEVAL_BUILD_PATH", &context.build_path);
        cmd.env("PROJEVAL_HOOK_TYPE", &context.hook_type);
        cmd.env(
            "PROJEVAL_PROJECT_FAILED",
            if context.project_failed { "true" } else { "false" },
        );

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        cmd
    }
}

/// Truncate output to 2 KiB on a character boundary.
fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_BYTES {
        return output.to_string();
    }
    let mut end = MAX_OUTPUT_BYTES;
    while !output.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... [truncated]", &output[..end])
}
