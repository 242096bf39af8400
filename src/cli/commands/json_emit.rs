//! JSON emit functions for CLI output
//!
//! Every JSON document the CLI prints is canonical JSON (JCS, RFC 8785), so
//! output is stable and byte-for-byte comparable.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use projeval_engine::{BuildConfigurationReport, ProjectOutcome};
use projeval_utils::logging::duration_ms;

pub const CONFIGURE_SCHEMA_VERSION: &str = "configure.v1";
pub const PROJECTS_SCHEMA_VERSION: &str = "projects.v1";
pub const CONFIG_SCHEMA_VERSION: &str = "config.v1";

/// Emit any serializable value as canonical JSON.
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String> {
    let bytes = serde_json_canonicalizer::to_vec(value).context("Failed to canonicalize JSON")?;
    String::from_utf8(bytes).context("Canonical JSON is not valid UTF-8")
}

/// `projeval configure --json`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigureJsonOutput {
    pub schema_version: String,
    pub succeeded: usize,
    pub failed: usize,
    pub projects: Vec<ProjectOutcomeJson>,
    /// Trace file written for this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_file: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectOutcomeJson {
    pub path: String,
    pub display_name: String,
    pub phase: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureJson {
    pub message: String,
    /// Cause chain, outermost first
    pub causes: Vec<String>,
}

impl ConfigureJsonOutput {
    #[must_use]
    pub fn from_report(report: &BuildConfigurationReport, trace_file: Option<String>) -> Self {
        Self {
            schema_version: CONFIGURE_SCHEMA_VERSION.to_string(),
            succeeded: report.succeeded_count(),
            failed: report.failed_count(),
            projects: report.outcomes.iter().map(ProjectOutcomeJson::from).collect(),
            trace_file,
        }
    }
}

impl From<&ProjectOutcome> for ProjectOutcomeJson {
    fn from(outcome: &ProjectOutcome) -> Self {
        Self {
            path: outcome.identity.identity_path().to_string(),
            display_name: outcome.identity.display_name(),
            phase: outcome.phase.to_string(),
            duration_ms: duration_ms(outcome.duration),
            failure: outcome.failure.as_ref().map(|failure| FailureJson {
                message: failure.message().to_string(),
                causes: failure.cause_messages(),
            }),
        }
    }
}

/// `projeval projects --json`
#[derive(Debug, Clone, Serialize)]
pub struct ProjectsJsonOutput {
    pub schema_version: String,
    pub build_path: String,
    pub projects: Vec<ProjectJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectJson {
    pub path: String,
    pub identity_path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configure: Option<String>,
    pub before_evaluate_hooks: usize,
    pub after_evaluate_hooks: usize,
}

/// `projeval config --json`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigJsonOutput {
    pub schema_version: String,
    pub effective_config: BTreeMap<String, ConfigValueJson>,
}

/// Configuration value with source attribution
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValueJson {
    pub value: String,
    pub source: String,
}

impl ConfigJsonOutput {
    #[must_use]
    pub fn new(effective_config: BTreeMap<String, (String, String)>) -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            effective_config: effective_config
                .into_iter()
                .map(|(key, (value, source))| (key, ConfigValueJson { value, source }))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_jcs_sorts_keys() {
        let output = ConfigJsonOutput::new(BTreeMap::from([(
            "parallel".to_string(),
            ("true".to_string(), "default".to_string()),
        )]));
        let json = emit_jcs(&output).unwrap();
        assert_eq!(
            json,
            r#"{"effective_config":{"parallel":{"source":"default","value":"true"}},"schema_version":"config.v1"}"#
        );
    }
}
