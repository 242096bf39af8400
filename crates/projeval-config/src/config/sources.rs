use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    match source {
        Some(ConfigSource::Cli) => "cli".to_string(),
        Some(ConfigSource::ConfigFile(path)) => format!("config ({})", path.display()),
        Some(ConfigSource::Programmatic) => "programmatic".to_string(),
        Some(ConfigSource::Defaults) | None => "default".to_string(),
    }
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add_config("show_stacktrace", self.show_stacktrace().to_string());
        add_config("verbose", self.verbose().to_string());
        add_config("parallel", self.parallel().to_string());
        if let Some(trace_file) = self.trace_file() {
            add_config("trace_file", trace_file.to_string());
        }
        add_config("build_path", self.build_path().to_string());
        add_config("build_name", self.build_name().to_string());

        let projects: Vec<String> = self
            .project_paths()
            .iter()
            .map(ToString::to_string)
            .collect();
        add_config("projects", projects.join(", "));

        let hook_count = self.hooks.before_evaluate.len() + self.hooks.after_evaluate.len();
        add_config("hooks", hook_count.to_string());

        config
    }
}
