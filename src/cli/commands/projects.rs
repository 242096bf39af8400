//! Projects command implementation
//!
//! Handles `projeval projects` and `projeval projects --json`.

use anyhow::Result;

use projeval_config::HookEvent;
use projeval_utils::types::{ProjectIdentity, ProjectPath};

use super::json_emit::{PROJECTS_SCHEMA_VERSION, ProjectJson, ProjectsJsonOutput, emit_jcs};
use crate::Config;

/// Execute the projects command
pub fn execute_projects_command(config: &Config, json: bool) -> Result<()> {
    let projects: Vec<ProjectJson> = config
        .project_paths()
        .iter()
        .map(|path| describe_project(config, path))
        .collect();

    if json {
        let output = ProjectsJsonOutput {
            schema_version: PROJECTS_SCHEMA_VERSION.to_string(),
            build_path: config.build_path().to_string(),
            projects,
        };
        println!("{}", emit_jcs(&output)?);
        return Ok(());
    }

    println!("Projects in build {} ({}):", config.build_name(), config.build_path());
    for project in &projects {
        println!("  {} ({})", project.identity_path, project.name);
        match &project.configure {
            Some(command) => println!("    configure: {command}"),
            None => println!("    configure: (none)"),
        }
        if project.before_evaluate_hooks + project.after_evaluate_hooks > 0 {
            println!(
                "    hooks: {} beforeEvaluate, {} afterEvaluate",
                project.before_evaluate_hooks, project.after_evaluate_hooks
            );
        }
    }
    Ok(())
}

fn describe_project(config: &Config, path: &ProjectPath) -> ProjectJson {
    let identity = ProjectIdentity::new(config.build_path(), path.clone(), config.build_name());
    ProjectJson {
        path: path.to_string(),
        identity_path: identity.identity_path().to_string(),
        name: identity.name,
        configure: config.project(path).and_then(|p| p.configure.clone()),
        before_evaluate_hooks: config.hooks_for(HookEvent::BeforeEvaluate, path).len(),
        after_evaluate_hooks: config.hooks_for(HookEvent::AfterEvaluate, path).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projeval_config::{HookConfig, ProjectConfig};

    #[test]
    fn test_describe_project_counts_wildcard_hooks() {
        let config = Config::builder()
            .build_path(":plugins")
            .project(":app", ProjectConfig::with_command("./configure.sh"))
            .before_evaluate_hook("*", HookConfig::new("true"))
            .after_evaluate_hook(":app", HookConfig::new("true"))
            .build()
            .unwrap();

        let app = describe_project(&config, &ProjectPath::parse(":app").unwrap());
        assert_eq!(app.identity_path, ":plugins:app");
        assert_eq!(app.configure.as_deref(), Some("./configure.sh"));
        assert_eq!(app.before_evaluate_hooks, 1);
        assert_eq!(app.after_evaluate_hooks, 1);

        let root = describe_project(&config, &ProjectPath::root());
        assert_eq!(root.name, "root");
        assert_eq!(root.configure, None);
        assert_eq!(root.after_evaluate_hooks, 0);
    }
}
