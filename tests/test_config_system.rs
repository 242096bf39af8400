//! Configuration discovery and precedence
//!
//! Exercises `Config::discover_from` against real `.projeval/config.toml`
//! files in temporary directories: upward discovery, CLI > file > defaults
//! precedence, source attribution, and the errors reported for missing,
//! malformed, and invalid files.

use std::fs;
use std::path::{Path, PathBuf};

use projeval::config::{ConfigSource, HookEvent, OnFail};
use projeval::error::ConfigError;
use projeval::types::{ProjectPath, ShowStacktrace};
use projeval::{CliArgs, Config, ProjevalError};
use tempfile::TempDir;

/// Create a build directory with a `.git` marker so discovery stops there.
fn build_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join(".git")).unwrap();
    temp_dir
}

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_dir = dir.join(".projeval");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("config.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

fn path(raw: &str) -> ProjectPath {
    ProjectPath::parse(raw).unwrap()
}

const SAMPLE_CONFIG: &str = r#"
[defaults]
show_stacktrace = "always"
parallel = false
trace_file = "build/trace.json"

[build]
name = "acme"

[projects.":app"]
configure = "./configure-app.sh"
timeout = 120

[projects.":lib"]

[hooks.before_evaluate."*"]
command = "echo configuring"
on_fail = "warn"

[hooks.after_evaluate.":app"]
command = "./verify-app.sh"
timeout = 5
"#;

#[test]
fn test_discovers_config_from_subdirectory() {
    let temp_dir = build_dir();
    let config_path = create_config_file(temp_dir.path(), SAMPLE_CONFIG);
    let nested = temp_dir.path().join("modules").join("app");
    fs::create_dir_all(&nested).unwrap();

    let config = Config::discover_from(&nested, &CliArgs::default()).unwrap();

    assert_eq!(config.root_dir.as_deref(), Some(temp_dir.path()));
    assert_eq!(config.build_name(), "acme");
    assert_eq!(config.show_stacktrace(), ShowStacktrace::Always);
    assert!(!config.parallel());
    assert_eq!(config.trace_file(), Some("build/trace.json"));
    assert_eq!(
        config.source_attribution.get("build_name"),
        Some(&ConfigSource::ConfigFile(config_path))
    );
}

#[test]
fn test_file_contents_are_loaded() {
    let temp_dir = build_dir();
    create_config_file(temp_dir.path(), SAMPLE_CONFIG);

    let config = Config::discover_from(temp_dir.path(), &CliArgs::default()).unwrap();

    assert_eq!(config.project_paths(), vec![path(":"), path(":app"), path(":lib")]);
    let app = config.project(&path(":app")).unwrap();
    assert_eq!(app.configure.as_deref(), Some("./configure-app.sh"));
    assert_eq!(app.timeout_secs(), 120);
    assert!(config.project(&path(":lib")).unwrap().configure.is_none());

    let before = config.hooks_for(HookEvent::BeforeEvaluate, &path(":lib"));
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].on_fail, OnFail::Warn);

    let after = config.hooks_for(HookEvent::AfterEvaluate, &path(":app"));
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].on_fail, OnFail::Fail);
    assert_eq!(after[0].timeout, 5);
    assert!(config.hooks_for(HookEvent::AfterEvaluate, &path(":lib")).is_empty());
}

#[test]
fn test_no_config_file_uses_defaults() {
    let temp_dir = build_dir();

    let config = Config::discover_from(temp_dir.path(), &CliArgs::default()).unwrap();

    assert!(config.root_dir.is_none());
    assert_eq!(config.show_stacktrace(), ShowStacktrace::InternalExceptions);
    assert!(config.parallel());
    assert!(!config.verbose());
    assert!(config.trace_file().is_none());
    assert_eq!(config.build_path(), ProjectPath::root());
    assert_eq!(config.project_paths(), vec![ProjectPath::root()]);
    assert_eq!(
        config.source_attribution.get("parallel"),
        Some(&ConfigSource::Defaults)
    );
}

#[test]
fn test_cli_overrides_file() {
    let temp_dir = build_dir();
    create_config_file(temp_dir.path(), SAMPLE_CONFIG);

    let cli_args = CliArgs {
        show_stacktrace: Some(ShowStacktrace::AlwaysFull),
        parallel: Some(true),
        trace_file: Some("other.json".to_string()),
        verbose: Some(true),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp_dir.path(), &cli_args).unwrap();

    assert_eq!(config.show_stacktrace(), ShowStacktrace::AlwaysFull);
    assert!(config.parallel());
    assert!(config.verbose());
    assert_eq!(config.trace_file(), Some("other.json"));
    for key in ["show_stacktrace", "parallel", "trace_file", "verbose"] {
        assert_eq!(config.source_attribution.get(key), Some(&ConfigSource::Cli), "{key}");
    }
    // Untouched by the CLI.
    assert_eq!(config.build_name(), "acme");
}

#[test]
fn test_effective_config_reports_sources() {
    let temp_dir = build_dir();
    create_config_file(temp_dir.path(), SAMPLE_CONFIG);
    let cli_args = CliArgs {
        parallel: Some(true),
        ..CliArgs::default()
    };

    let effective = Config::discover_from(temp_dir.path(), &cli_args)
        .unwrap()
        .effective_config();

    assert_eq!(effective["parallel"], ("true".to_string(), "cli".to_string()));
    assert_eq!(effective["show_stacktrace"].0, "always");
    assert!(effective["show_stacktrace"].1.starts_with("config ("));
    assert_eq!(effective["verbose"], ("false".to_string(), "default".to_string()));
    assert_eq!(effective["projects"].0, ":, :app, :lib");
    assert_eq!(effective["hooks"].0, "2");
}

#[test]
fn test_explicit_config_path_bypasses_discovery() {
    let temp_dir = build_dir();
    create_config_file(temp_dir.path(), SAMPLE_CONFIG);
    let explicit = temp_dir.path().join("ci.toml");
    fs::write(&explicit, "[build]\nname = \"ci\"\n").unwrap();

    let cli_args = CliArgs {
        config_path: Some(explicit),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp_dir.path(), &cli_args).unwrap();

    assert_eq!(config.build_name(), "ci");
    assert_eq!(config.root_dir.as_deref(), Some(temp_dir.path()));
    assert_eq!(config.project_paths(), vec![ProjectPath::root()]);
}

#[test]
fn test_missing_explicit_config_is_not_found() {
    let temp_dir = build_dir();
    let cli_args = CliArgs {
        config_path: Some(temp_dir.path().join("missing.toml")),
        ..CliArgs::default()
    };

    let err = Config::discover_from(temp_dir.path(), &cli_args).unwrap_err();
    assert!(
        matches!(err, ProjevalError::Config(ConfigError::NotFound { .. })),
        "unexpected error: {err:?}"
    );
}

#[test]
fn test_malformed_toml_is_invalid_file() {
    let temp_dir = build_dir();
    create_config_file(temp_dir.path(), "[defaults\nparallel = ");

    let err = Config::discover_from(temp_dir.path(), &CliArgs::default()).unwrap_err();
    assert!(
        matches!(err, ProjevalError::Config(ConfigError::InvalidFile(_))),
        "unexpected error: {err:?}"
    );
}

#[test]
fn test_unknown_section_is_rejected() {
    let temp_dir = build_dir();
    create_config_file(temp_dir.path(), "[runner]\nmode = \"native\"\n");

    let err = Config::discover_from(temp_dir.path(), &CliArgs::default()).unwrap_err();
    let ProjevalError::Config(ConfigError::InvalidFile(reason)) = err else {
        panic!("expected an invalid file error");
    };
    assert!(reason.contains("runner"), "{reason}");
}

#[test]
fn test_unknown_stacktrace_mode_is_rejected() {
    let temp_dir = build_dir();
    create_config_file(temp_dir.path(), "[defaults]\nshow_stacktrace = \"sometimes\"\n");

    let err = Config::discover_from(temp_dir.path(), &CliArgs::default()).unwrap_err();
    assert!(matches!(
        err,
        ProjevalError::Config(ConfigError::InvalidFile(_))
    ));
}

#[test]
fn test_validation_collects_every_problem() {
    let temp_dir = build_dir();
    create_config_file(
        temp_dir.path(),
        r#"
[projects."app"]
configure = "true"

[projects.":lib"]
configure = "  "
timeout = 0

[hooks.after_evaluate.":missing"]
command = "true"
"#,
    );

    let err = Config::discover_from(temp_dir.path(), &CliArgs::default()).unwrap_err();
    let ProjevalError::Config(ConfigError::ValidationFailed {
        errors,
        error_count,
    }) = err
    else {
        panic!("expected a validation failure");
    };

    assert_eq!(error_count, 4);
    assert_eq!(errors.len(), 4);
    assert!(errors.iter().any(|e| e.contains("'app'")));
    assert!(errors.iter().any(|e| e.contains("configure")));
    assert!(errors.iter().any(|e| e.contains("greater than 0")));
    assert!(errors.iter().any(|e| e.contains("':missing'")));
}

#[test]
fn test_single_validation_problem_is_reported_directly() {
    let temp_dir = build_dir();
    create_config_file(temp_dir.path(), "[build]\npath = \"acme\"\n");

    let err = Config::discover_from(temp_dir.path(), &CliArgs::default()).unwrap_err();
    assert!(matches!(
        err,
        ProjevalError::Config(ConfigError::InvalidProjectPath { .. })
    ));
}

#[test]
fn test_discovery_stops_at_repository_root() {
    let outer = build_dir();
    create_config_file(outer.path(), SAMPLE_CONFIG);
    let inner = outer.path().join("vendored");
    fs::create_dir_all(inner.join(".git")).unwrap();

    let config = Config::discover_from(&inner, &CliArgs::default()).unwrap();
    assert!(config.root_dir.is_none());
    assert_eq!(config.build_name(), "root");
}
