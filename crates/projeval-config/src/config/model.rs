use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use projeval_utils::types::{ProjectPath, ShowStacktrace};

/// Default timeout for hook and configure commands in seconds
pub const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 60;

/// Root project name used when `[build].name` is not set
pub const DEFAULT_BUILD_NAME: &str = "root";

/// Hook table key matching every project
pub const ALL_PROJECTS: &str = "*";

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from the given configuration file.
    ConfigFile(PathBuf),
    /// Value provided programmatically (`Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Defaults,
}

/// Hook failure behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFail {
    /// Log warning and continue
    Warn,
    /// Fail the project configuration (default)
    #[default]
    Fail,
}

impl std::fmt::Display for OnFail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Lifecycle event a hook is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeEvaluate,
    AfterEvaluate,
}

impl HookEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeEvaluate => "before_evaluate",
            Self::AfterEvaluate => "after_evaluate",
        }
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a single hook
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HookConfig {
    /// Shell command to execute
    pub command: String,
    /// Behavior on hook failure (default: fail)
    #[serde(default)]
    pub on_fail: OnFail,
    /// Timeout in seconds (default: 60)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl HookConfig {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            on_fail: OnFail::default(),
            timeout: DEFAULT_HOOK_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn on_fail(mut self, on_fail: OnFail) -> Self {
        self.on_fail = on_fail;
        self
    }

    #[must_use]
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}

fn default_timeout() -> u64 {
    DEFAULT_HOOK_TIMEOUT_SECS
}

/// Hooks configuration section from config.toml
///
/// Tables are keyed by project path, or `"*"` for every project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HooksConfig {
    #[serde(default)]
    pub before_evaluate: BTreeMap<String, HookConfig>,
    #[serde(default)]
    pub after_evaluate: BTreeMap<String, HookConfig>,
}

impl HooksConfig {
    #[must_use]
    pub fn table(&self, event: HookEvent) -> &BTreeMap<String, HookConfig> {
        match event {
            HookEvent::BeforeEvaluate => &self.before_evaluate,
            HookEvent::AfterEvaluate => &self.after_evaluate,
        }
    }

    pub(crate) fn table_mut(&mut self, event: HookEvent) -> &mut BTreeMap<String, HookConfig> {
        match event {
            HookEvent::BeforeEvaluate => &mut self.before_evaluate,
            HookEvent::AfterEvaluate => &mut self.after_evaluate,
        }
    }

    /// Hooks that apply to `project`, wildcard hook first.
    #[must_use]
    pub fn hooks_for(&self, event: HookEvent, project: &ProjectPath) -> Vec<&HookConfig> {
        let table = self.table(event);
        table
            .get(ALL_PROJECTS)
            .into_iter()
            .chain(table.get(project.as_str()))
            .collect()
    }

    #[must_use]
    pub fn has_hooks(&self) -> bool {
        !self.before_evaluate.is_empty() || !self.after_evaluate.is_empty()
    }
}

/// Per-project configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Command that performs the project's configuration
    pub configure: Option<String>,
    /// Timeout for `configure` in seconds (default: 60)
    pub timeout: Option<u64>,
}

impl ProjectConfig {
    #[must_use]
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            configure: Some(command.into()),
            timeout: None,
        }
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_HOOK_TIMEOUT_SECS)
    }
}

/// `[build]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Identity path of the build (default `:`)
    pub path: Option<String>,
    /// Name of the root project (default `root`)
    pub name: Option<String>,
}

/// `[defaults]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    pub show_stacktrace: Option<ShowStacktrace>,
    pub verbose: Option<bool>,
    /// Configure independent projects on parallel threads (default: true)
    pub parallel: Option<bool>,
    /// Where to write the operation trace, if anywhere
    pub trace_file: Option<String>,
}

/// Configuration for projeval.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// show_stacktrace = "internal-exceptions"
/// parallel = true
/// trace_file = "build/projeval-trace.json"
///
/// [build]
/// name = "acme"
///
/// [projects.":app"]
/// configure = "./configure-app.sh"
/// timeout = 120
///
/// [hooks.before_evaluate."*"]
/// command = "echo configuring $PROJEVAL_PROJECT_PATH"
/// on_fail = "warn"
///
/// [hooks.after_evaluate.":app"]
/// command = "./verify-app.sh"
/// ```
///
/// The root project `:` always exists, whether or not it has a `[projects]` entry.
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub build: BuildConfig,
    /// Per-project configuration keyed by project path.
    pub projects: BTreeMap<String, ProjectConfig>,
    pub hooks: HooksConfig,
    /// Directory commands run in: the parent of `.projeval/`.
    pub root_dir: Option<PathBuf>,
    /// Source attribution for each setting (for `projeval config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    #[must_use]
    pub fn show_stacktrace(&self) -> ShowStacktrace {
        self.defaults.show_stacktrace.unwrap_or_default()
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    #[must_use]
    pub fn parallel(&self) -> bool {
        self.defaults.parallel.unwrap_or(true)
    }

    #[must_use]
    pub fn trace_file(&self) -> Option<&str> {
        self.defaults.trace_file.as_deref()
    }

    /// Identity path of this build. Invalid paths are rejected by validation.
    #[must_use]
    pub fn build_path(&self) -> ProjectPath {
        self.build
            .path
            .as_deref()
            .and_then(|raw| ProjectPath::parse(raw).ok())
            .unwrap_or_else(ProjectPath::root)
    }

    #[must_use]
    pub fn build_name(&self) -> &str {
        self.build.name.as_deref().unwrap_or(DEFAULT_BUILD_NAME)
    }

    /// All project paths, root first, then in path order.
    #[must_use]
    pub fn project_paths(&self) -> Vec<ProjectPath> {
        let mut paths: Vec<ProjectPath> = self
            .projects
            .keys()
            .filter_map(|raw| ProjectPath::parse(raw).ok())
            .collect();
        if !paths.iter().any(ProjectPath::is_root) {
            paths.push(ProjectPath::root());
        }
        paths.sort();
        paths.dedup();
        paths
    }

    #[must_use]
    pub fn project(&self, path: &ProjectPath) -> Option<&ProjectConfig> {
        self.projects.get(path.as_str())
    }

    #[must_use]
    pub fn hooks_for(&self, event: HookEvent, project: &ProjectPath) -> Vec<&HookConfig> {
        self.hooks.hooks_for(event, project)
    }
}
