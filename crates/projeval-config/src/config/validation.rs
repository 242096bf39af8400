use projeval_utils::error::ConfigError;
use projeval_utils::types::ProjectPath;

use super::{ALL_PROJECTS, Config, HookEvent};

impl Config {
    /// Validate configuration values.
    ///
    /// Every problem is collected; a single problem is returned as-is, several
    /// are returned as [`ConfigError::ValidationFailed`].
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<ConfigError> = Vec::new();

        if let Some(raw) = &self.build.path
            && let Err(e) = ProjectPath::parse(raw)
        {
            errors.push(e);
        }

        if let Some(name) = &self.build.name
            && name.trim().is_empty()
        {
            errors.push(ConfigError::InvalidValue {
                key: "build.name".to_string(),
                value: "must not be empty".to_string(),
            });
        }

        if let Some(trace_file) = &self.defaults.trace_file
            && trace_file.trim().is_empty()
        {
            errors.push(ConfigError::InvalidValue {
                key: "trace_file".to_string(),
                value: "must not be empty".to_string(),
            });
        }

        for (raw, project) in &self.projects {
            if let Err(e) = ProjectPath::parse(raw) {
                errors.push(e);
                continue;
            }
            if let Some(command) = &project.configure
                && command.trim().is_empty()
            {
                errors.push(ConfigError::InvalidValue {
                    key: format!("projects.\"{raw}\".configure"),
                    value: "must not be empty".to_string(),
                });
            }
            if project.timeout == Some(0) {
                errors.push(ConfigError::InvalidValue {
                    key: "timeout".to_string(),
                    value: format!("projects.\"{raw}\".timeout must be greater than 0"),
                });
            }
        }

        let known = self.project_paths();
        for event in [HookEvent::BeforeEvaluate, HookEvent::AfterEvaluate] {
            for (key, hook) in self.hooks.table(event) {
                let table = format!("hooks.{event}.\"{key}\"");
                if key != ALL_PROJECTS {
                    match ProjectPath::parse(key) {
                        Ok(path) if !known.contains(&path) => {
                            errors.push(ConfigError::InvalidValue {
                                key: table.clone(),
                                value: format!("no project is configured at '{path}'"),
                            });
                        }
                        Ok(_) => {}
                        Err(e) => errors.push(e),
                    }
                }
                if hook.command.trim().is_empty() {
                    errors.push(ConfigError::InvalidValue {
                        key: format!("{table}.command"),
                        value: "must not be empty".to_string(),
                    });
                }
                if hook.timeout == 0 {
                    errors.push(ConfigError::InvalidValue {
                        key: "timeout".to_string(),
                        value: format!("{table}.timeout must be greater than 0"),
                    });
                }
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            error_count => Err(ConfigError::ValidationFailed {
                errors: errors.iter().map(ToString::to_string).collect(),
                error_count,
            }),
        }
    }
}
