//! Projects, hooks and configure steps backed by shell commands from [`Config`].

use std::collections::BTreeMap;
use std::sync::Arc;

use projeval_config::{Config, HookConfig, HookEvent};
use projeval_hooks::{CommandExecutor, HookContext, HookType, execute_and_process_hook};
use projeval_operations::OperationRunner;
use projeval_utils::error::{HookError, ProjectConfigurationError, ProjevalError};
use projeval_utils::types::{ProjectIdentity, ProjectPath};

use crate::evaluator::{LifecycleEvaluator, ProjectEvaluator};
use crate::project::{Project, ProjectEvaluationListener};
use crate::registry::ProjectRegistry;
use crate::state::EvaluationState;

/// Runs a configured hook command for one lifecycle event.
#[derive(Debug, Clone)]
pub struct CommandHookListener {
    event: HookEvent,
    hook: HookConfig,
    executor: CommandExecutor,
}

impl CommandHookListener {
    #[must_use]
    pub fn new(event: HookEvent, hook: HookConfig, executor: CommandExecutor) -> Self {
        Self {
            event,
            hook,
            executor,
        }
    }

    #[must_use]
    pub fn event(&self) -> HookEvent {
        self.event
    }

    fn run(&self, project: &Project, failure: Option<&ProjectConfigurationError>) -> anyhow::Result<()> {
        let mut context = HookContext::new(project.identity(), self.event.into());
        if let Some(failure) = failure {
            context = context.with_failure(failure.to_string());
        }
        execute_and_process_hook(&self.executor, &self.hook, &context)?.into_result()?;
        Ok(())
    }
}

impl ProjectEvaluationListener for CommandHookListener {
    fn before_evaluate(&self, project: &Project) -> anyhow::Result<()> {
        if self.event != HookEvent::BeforeEvaluate {
            return Ok(());
        }
        self.run(project, None)
    }

    fn after_evaluate(&self, project: &Project, state: &EvaluationState) -> anyhow::Result<()> {
        if self.event != HookEvent::AfterEvaluate {
            return Ok(());
        }
        self.run(project, state.failure())
    }
}

#[derive(Debug, Clone)]
struct ConfigureCommand {
    command: String,
    timeout_secs: u64,
}

/// Configures a project by running its `configure` command.
///
/// Projects without a command have nothing to configure and always succeed.
#[derive(Debug, Clone, Default)]
pub struct CommandEvaluator {
    executor: CommandExecutor,
    commands: BTreeMap<ProjectPath, ConfigureCommand>,
}

impl CommandEvaluator {
    #[must_use]
    pub fn new(executor: CommandExecutor) -> Self {
        Self {
            executor,
            commands: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_command(
        mut self,
        path: ProjectPath,
        command: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        self.commands.insert(
            path,
            ConfigureCommand {
                command: command.into(),
                timeout_secs,
            },
        );
        self
    }

    /// Commands of every `[projects]` entry that has one.
    #[must_use]
    pub fn from_config(config: &Config, executor: CommandExecutor) -> Self {
        config
            .project_paths()
            .into_iter()
            .filter_map(|path| {
                let project = config.project(&path)?;
                let command = project.configure.clone()?;
                Some((path, command, project.timeout_secs()))
            })
            .fold(Self::new(executor), |evaluator, (path, command, timeout)| {
                evaluator.with_command(path, command, timeout)
            })
    }

    #[must_use]
    pub fn command_for(&self, path: &ProjectPath) -> Option<&str> {
        self.commands.get(path).map(|c| c.command.as_str())
    }
}

impl ProjectEvaluator for CommandEvaluator {
    fn evaluate(&self, project: &Project, _state: &EvaluationState) -> anyhow::Result<()> {
        let identity = project.identity();
        let Some(configure) = self.commands.get(&identity.project_path) else {
            tracing::debug!(project = %identity, "No configure command");
            return Ok(());
        };

        let context = HookContext::new(identity, HookType::Configure);
        let result = self
            .executor
            .execute_blocking(&configure.command, configure.timeout_secs, &context)?;

        if result.timed_out {
            return Err(HookError::Timeout {
                command: configure.command.clone(),
                timeout_seconds: configure.timeout_secs,
            }
            .into());
        }
        if !result.success {
            return Err(HookError::ExecutionFailed {
                command: configure.command.clone(),
                code: result.exit_code,
                stderr: result.stderr,
            }
            .into());
        }

        tracing::debug!(
            project = %identity,
            command = %configure.command,
            duration_ms = result.duration_ms,
            "Configure command finished"
        );
        Ok(())
    }
}

impl ProjectRegistry<CommandEvaluator> {
    /// Build the registry described by `config`: one project per configured
    /// path plus the root, with command hooks attached.
    pub fn from_config(config: &Config, operations: OperationRunner) -> Result<Self, ProjevalError> {
        let executor = CommandExecutor::new(config.root_dir.clone());
        let evaluator = LifecycleEvaluator::new(
            operations,
            CommandEvaluator::from_config(config, executor.clone()),
        )
        .with_show_stacktrace(config.show_stacktrace());

        let mut registry = Self::new(evaluator);
        let build_path = config.build_path();
        for path in config.project_paths() {
            let project = Project::new(ProjectIdentity::new(
                build_path.clone(),
                path.clone(),
                config.build_name(),
            ));
            for event in [HookEvent::BeforeEvaluate, HookEvent::AfterEvaluate] {
                for hook in config.hooks_for(event, &path) {
                    project.add_evaluation_listener(Arc::new(CommandHookListener::new(
                        event,
                        hook.clone(),
                        executor.clone(),
                    )));
                }
            }
            registry.register(project)?;
        }
        Ok(registry)
    }
}
