//! End-to-end tests for the projeval binary
//!
//! Each test writes a `.projeval/config.toml` into a temporary build root and
//! runs the compiled binary there with `assert_cmd`. Configure commands and
//! hooks are shell snippets, so these tests only run on Unix.

#![cfg(unix)]

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn build_root(config: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join(".git")).unwrap();
    let config_dir = temp_dir.path().join(".projeval");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), config).unwrap();
    temp_dir
}

fn projeval_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("projeval"));
    cmd.current_dir(dir);
    cmd.env_remove("PROJEVAL_CONFIG");
    cmd.stdin(Stdio::null());
    cmd
}

const PASSING_BUILD: &str = r#"
[build]
name = "acme"

[projects.":app"]
configure = "echo configured > app.marker"

[projects.":lib"]
configure = "true"

[hooks.after_evaluate."*"]
command = "echo \"$PROJEVAL_PROJECT_PATH\" >> after.log"
"#;

const FAILING_BUILD: &str = r#"
[projects.":app"]
configure = "echo 'app script broke' >&2; exit 7"

[projects.":lib"]
configure = "true"
"#;

#[test]
fn configure_all_projects_succeeds() {
    let build = build_root(PASSING_BUILD);

    projeval_cmd(build.path())
        .arg("configure")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configured 3 project(s): 3 succeeded, 0 failed"))
        .stdout(predicate::str::contains("✓ :app"))
        .stdout(predicate::str::contains("✓ :lib"));

    assert!(build.path().join("app.marker").exists());
    let after_log = fs::read_to_string(build.path().join("after.log")).unwrap();
    let mut notified: Vec<&str> = after_log.lines().collect();
    notified.sort_unstable();
    assert_eq!(notified, vec![":", ":app", ":lib"]);
}

#[test]
fn configure_selected_project_only() {
    let build = build_root(PASSING_BUILD);

    projeval_cmd(build.path())
        .args(["configure", ":lib", "--serial"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configured 1 project(s)"));

    assert!(!build.path().join("app.marker").exists());
}

#[test]
fn failing_configure_command_exits_with_configuration_failure() {
    let build = build_root(FAILING_BUILD);

    projeval_cmd(build.path())
        .args(["configure", "--serial"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("2 succeeded, 1 failed"))
        .stdout(predicate::str::contains("✗ :app"))
        .stderr(predicate::str::contains(
            "A problem occurred configuring project ':app'.",
        ))
        .stdout(predicate::str::contains("> Hook command failed with exit code 7"));
}

#[test]
fn failing_before_hook_skips_configure_command() {
    let build = build_root(
        r#"
[projects.":app"]
configure = "touch app.marker"

[hooks.before_evaluate.":app"]
command = "exit 1"
"#,
    );

    projeval_cmd(build.path())
        .args(["configure", ":app"])
        .assert()
        .code(3);

    assert!(!build.path().join("app.marker").exists());
}

#[test]
fn warn_hook_failure_does_not_fail_project() {
    let build = build_root(
        r#"
[projects.":app"]
configure = "true"

[hooks.before_evaluate.":app"]
command = "exit 1"
on_fail = "warn"
"#,
    );

    projeval_cmd(build.path())
        .args(["configure", ":app"])
        .assert()
        .success();
}

#[test]
fn configure_json_output_is_canonical() {
    let build = build_root(FAILING_BUILD);

    let output = projeval_cmd(build.path())
        .args(["configure", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let json: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(json["schema_version"], "configure.v1");
    assert_eq!(json["succeeded"], 2);
    assert_eq!(json["failed"], 1);

    let projects = json["projects"].as_array().unwrap();
    let app = projects.iter().find(|p| p["path"] == ":app").unwrap();
    assert_eq!(app["phase"], "executed");
    assert_eq!(
        app["failure"]["message"],
        "A problem occurred configuring project ':app'."
    );
    let lib = projects.iter().find(|p| p["path"] == ":lib").unwrap();
    assert!(lib.get("failure").is_none());

    // JCS puts keys in sorted order.
    assert!(stdout.trim_start().starts_with("{\"failed\":1,"));
}

#[test]
fn trace_file_is_written_relative_to_build_root() {
    let build = build_root(PASSING_BUILD);
    let nested = build.path().join("modules");
    fs::create_dir_all(&nested).unwrap();

    projeval_cmd(&nested)
        .args(["configure", "--trace-file", "out/trace.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trace written to"));

    let trace = fs::read_to_string(build.path().join("out").join("trace.json")).unwrap();
    assert!(trace.contains("Configure project :app"));
    assert!(trace.contains("Execute afterEvaluate hooks (:lib)"));
    let trace: serde_json::Value = serde_json::from_str(&trace).unwrap();
    assert_eq!(trace["schema_version"], "1");
    // Three projects, three operations each.
    assert_eq!(trace["operations"].as_array().unwrap().len(), 9);
}

#[test]
fn unwritable_trace_file_does_not_hide_project_failure() {
    let build = build_root(FAILING_BUILD);
    fs::write(build.path().join("blocker"), "not a directory").unwrap();

    projeval_cmd(build.path())
        .args(["configure", "--serial", "--trace-file", "blocker/trace.json"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("✗ :app"))
        .stdout(predicate::str::contains("Trace written to").not())
        .stderr(predicate::str::contains(
            "A problem occurred configuring project ':app'.",
        ))
        .stderr(predicate::str::contains("Failed to write trace file"));
}

#[test]
fn unwritable_trace_file_fails_successful_run() {
    let build = build_root(PASSING_BUILD);
    fs::write(build.path().join("blocker"), "not a directory").unwrap();

    projeval_cmd(build.path())
        .args(["configure", "--trace-file", "blocker/trace.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("3 succeeded, 0 failed"))
        .stderr(predicate::str::contains("Failed to write trace file"));
}

#[test]
fn unknown_project_is_rejected() {
    let build = build_root(PASSING_BUILD);

    projeval_cmd(build.path())
        .args(["configure", ":missing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No project is configured at ':missing'"));
}

#[test]
fn malformed_project_path_is_a_usage_error() {
    let build = build_root(PASSING_BUILD);

    projeval_cmd(build.path())
        .args(["configure", "app"])
        .assert()
        .code(2);
}

#[test]
fn invalid_config_file_is_reported() {
    let build = build_root("[defaults]\nparallel = \"sometimes\"\n");

    projeval_cmd(build.path())
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration file has invalid format"));
}

#[test]
fn projects_json_lists_every_project() {
    let build = build_root(PASSING_BUILD);

    let output = projeval_cmd(build.path())
        .args(["projects", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["schema_version"], "projects.v1");
    let paths: Vec<&str> = json["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec![":", ":app", ":lib"]);
    assert_eq!(json["projects"][0]["name"], "acme");
    assert_eq!(json["projects"][1]["after_evaluate_hooks"], 1);
}

#[test]
fn config_command_shows_sources() {
    let build = build_root(PASSING_BUILD);

    projeval_cmd(build.path())
        .args(["config", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build_name = acme (from config ("))
        .stdout(predicate::str::contains("verbose = true (from cli)"))
        .stdout(predicate::str::contains("parallel = true (from default)"));
}

#[test]
fn explicit_config_flag_overrides_discovery() {
    let build = build_root(PASSING_BUILD);
    let explicit = build.path().join("other.toml");
    fs::write(&explicit, "[build]\nname = \"other\"\n").unwrap();

    projeval_cmd(build.path())
        .arg("projects")
        .arg("--config")
        .arg(&explicit)
        .assert()
        .success()
        .stdout(predicate::str::contains("Projects in build other (:)"));
}
