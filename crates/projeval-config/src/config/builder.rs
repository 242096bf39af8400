use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use projeval_utils::error::ConfigError;
use projeval_utils::types::ShowStacktrace;

use super::{
    BuildConfig, Config, ConfigSource, Defaults, HookConfig, HookEvent, HooksConfig,
    ProjectConfig,
};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use projeval_config::{Config, HookConfig, ProjectConfig};
    ///
    /// let config = Config::builder()
    ///     .build_name("acme")
    ///     .project(":app", ProjectConfig::with_command("./configure.sh"))
    ///     .after_evaluate_hook("*", HookConfig::new("./verify.sh"))
    ///     .parallel(false)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.project_paths().len(), 2);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration of projeval.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic` in the resulting `Config`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    defaults: Defaults,
    build: BuildConfig,
    projects: BTreeMap<String, ProjectConfig>,
    hooks: HooksConfig,
    root_dir: Option<PathBuf>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn show_stacktrace(mut self, show_stacktrace: ShowStacktrace) -> Self {
        self.defaults.show_stacktrace = Some(show_stacktrace);
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.defaults.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.defaults.parallel = Some(parallel);
        self
    }

    #[must_use]
    pub fn trace_file(mut self, path: impl Into<String>) -> Self {
        self.defaults.trace_file = Some(path.into());
        self
    }

    /// Identity path of the build, e.g. `:plugins` for an included build.
    #[must_use]
    pub fn build_path(mut self, path: impl Into<String>) -> Self {
        self.build.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn build_name(mut self, name: impl Into<String>) -> Self {
        self.build.name = Some(name.into());
        self
    }

    /// Directory that configure and hook commands run in.
    #[must_use]
    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn project(mut self, path: impl Into<String>, project: ProjectConfig) -> Self {
        self.projects.insert(path.into(), project);
        self
    }

    /// Attach a hook to the project at `path`, or to every project with `"*"`.
    #[must_use]
    pub fn hook(mut self, event: HookEvent, path: impl Into<String>, hook: HookConfig) -> Self {
        self.hooks.table_mut(event).insert(path.into(), hook);
        self
    }

    #[must_use]
    pub fn before_evaluate_hook(self, path: impl Into<String>, hook: HookConfig) -> Self {
        self.hook(HookEvent::BeforeEvaluate, path, hook)
    }

    #[must_use]
    pub fn after_evaluate_hook(self, path: impl Into<String>, hook: HookConfig) -> Self {
        self.hook(HookEvent::AfterEvaluate, path, hook)
    }

    /// Build and validate the `Config`.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let mut attribute = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Defaults
            };
            source_attribution.insert(key.to_string(), source);
        };

        attribute("show_stacktrace", self.defaults.show_stacktrace.is_some());
        attribute("verbose", self.defaults.verbose.is_some());
        attribute("parallel", self.defaults.parallel.is_some());
        attribute("build_path", self.build.path.is_some());
        attribute("build_name", self.build.name.is_some());
        if self.defaults.trace_file.is_some() {
            attribute("trace_file", true);
        }
        if !self.projects.is_empty() {
            attribute("projects", true);
        }
        if self.hooks.has_hooks() {
            attribute("hooks", true);
        }

        let config = Config {
            defaults: self.defaults,
            build: self.build,
            projects: self.projects,
            hooks: self.hooks,
            root_dir: self.root_dir,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projeval_utils::types::ProjectPath;

    #[test]
    fn test_builder_attributes_programmatic_values() {
        let config = Config::builder()
            .show_stacktrace(ShowStacktrace::AlwaysFull)
            .build_path(":plugins")
            .build()
            .unwrap();

        assert_eq!(config.show_stacktrace(), ShowStacktrace::AlwaysFull);
        assert_eq!(config.build_path(), ProjectPath::parse(":plugins").unwrap());
        assert_eq!(
            config.source_attribution.get("show_stacktrace"),
            Some(&ConfigSource::Programmatic)
        );
        assert_eq!(
            config.source_attribution.get("verbose"),
            Some(&ConfigSource::Defaults)
        );
    }

    #[test]
    fn test_builder_hooks() {
        let config = Config::builder()
            .project(":app", ProjectConfig::default())
            .before_evaluate_hook(":app", HookConfig::new("a"))
            .after_evaluate_hook("*", HookConfig::new("b"))
            .build()
            .unwrap();

        let app = ProjectPath::parse(":app").unwrap();
        assert_eq!(config.hooks_for(HookEvent::BeforeEvaluate, &app).len(), 1);
        assert_eq!(config.hooks_for(HookEvent::AfterEvaluate, &app).len(), 1);
        assert_eq!(
            config.hooks_for(HookEvent::BeforeEvaluate, &ProjectPath::root()).len(),
            0
        );
    }

    #[test]
    fn test_builder_validates() {
        let err = Config::builder()
            .before_evaluate_hook(":missing", HookConfig::new("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
