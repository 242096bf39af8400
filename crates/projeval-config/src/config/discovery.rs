use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::{Path, PathBuf};

use projeval_utils::error::{ConfigError, ProjevalError};

use super::{
    BuildConfig, CliArgs, Config, ConfigSource, Defaults, HooksConfig, ProjectConfig,
};

/// Directory holding the configuration file
pub const CONFIG_DIR: &str = ".projeval";

/// Configuration file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "PROJEVAL_CONFIG";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    defaults: Option<Defaults>,
    build: Option<BuildConfig>,
    projects: Option<BTreeMap<String, ProjectConfig>>,
    hooks: Option<HooksConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Without an explicit `config_path`, `PROJEVAL_CONFIG` is consulted, then
    /// `.projeval/config.toml` is searched upward from the current directory.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ProjevalError> {
        let start_dir = env::current_dir()?;
        if cli_args.config_path.is_none()
            && let Some(env_path) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty())
        {
            let mut args = cli_args.clone();
            args.config_path = Some(PathBuf::from(env_path));
            return Self::discover_from(&start_dir, &args);
        }
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ProjevalError> {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut build = BuildConfig::default();
        let mut projects = BTreeMap::new();
        let mut hooks = HooksConfig::default();

        for key in ["show_stacktrace", "verbose", "parallel", "build_path", "build_name"] {
            source_attribution.insert(key.to_string(), ConfigSource::Defaults);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    }
                    .into());
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        let root_dir = config_path.as_deref().map(root_dir_for);

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)?;
            let config_source = ConfigSource::ConfigFile(path.clone());

            tracing::debug!(path = %path.display(), "Loaded configuration file");

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.show_stacktrace.is_some() {
                    defaults.show_stacktrace = file_defaults.show_stacktrace;
                    source_attribution.insert("show_stacktrace".to_string(), config_source.clone());
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), config_source.clone());
                }
                if file_defaults.parallel.is_some() {
                    defaults.parallel = file_defaults.parallel;
                    source_attribution.insert("parallel".to_string(), config_source.clone());
                }
                if file_defaults.trace_file.is_some() {
                    defaults.trace_file = file_defaults.trace_file;
                    source_attribution.insert("trace_file".to_string(), config_source.clone());
                }
            }

            if let Some(file_build) = file_config.build {
                if file_build.path.is_some() {
                    build.path = file_build.path;
                    source_attribution.insert("build_path".to_string(), config_source.clone());
                }
                if file_build.name.is_some() {
                    build.name = file_build.name;
                    source_attribution.insert("build_name".to_string(), config_source.clone());
                }
            }

            if let Some(file_projects) = file_config.projects {
                projects = file_projects;
                source_attribution.insert("projects".to_string(), config_source.clone());
            }

            if let Some(file_hooks) = file_config.hooks {
                hooks = file_hooks;
                source_attribution.insert("hooks".to_string(), config_source);
            }
        }

        // Apply CLI overrides (highest priority)
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }
        if let Some(show_stacktrace) = cli_args.show_stacktrace {
            defaults.show_stacktrace = Some(show_stacktrace);
            source_attribution.insert("show_stacktrace".to_string(), ConfigSource::Cli);
        }
        if let Some(parallel) = cli_args.parallel {
            defaults.parallel = Some(parallel);
            source_attribution.insert("parallel".to_string(), ConfigSource::Cli);
        }
        if let Some(trace_file) = &cli_args.trace_file {
            defaults.trace_file = Some(trace_file.clone());
            source_attribution.insert("trace_file".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            build,
            projects,
            hooks,
            root_dir,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Search upward from `start_dir` for `.projeval/config.toml`.
    ///
    /// Stops at repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = start_dir;

        loop {
            let config_path = current_dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                return None;
            }

            current_dir = current_dir.parent()?;
        }
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ProjevalError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFile(format!("{}: {}", path.display(), e.message())).into()
        })
    }
}

/// Directory commands run in for a given config file: the parent of
/// `.projeval/`, or the file's own directory for files elsewhere.
fn root_dir_for(config_path: &Path) -> PathBuf {
    let dir = config_path.parent().unwrap_or(Path::new("."));
    if dir.file_name().is_some_and(|name| name == CONFIG_DIR) {
        dir.parent().unwrap_or(dir).to_path_buf()
    } else {
        dir.to_path_buf()
    }
}
