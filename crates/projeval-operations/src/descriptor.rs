use serde::{Deserialize, Serialize};
use std::fmt;

use projeval_utils::types::{ProjectIdentity, ProjectPath};

/// Kind of work an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationCategory {
    ConfigureProject,
    BeforeEvaluateHooks,
    AfterEvaluateHooks,
}

impl OperationCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigureProject => "configure_project",
            Self::BeforeEvaluateHooks => "before_evaluate_hooks",
            Self::AfterEvaluateHooks => "after_evaluate_hooks",
        }
    }
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier assigned to an operation when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structured details attached to every project operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDetails {
    /// Path of the project inside its build.
    pub project_path: ProjectPath,
    /// Identity path of the owning build.
    pub build_path: ProjectPath,
}

impl From<&ProjectIdentity> for OperationDetails {
    fn from(identity: &ProjectIdentity) -> Self {
        Self {
            project_path: identity.project_path.clone(),
            build_path: identity.build_path.clone(),
        }
    }
}

/// Description of an operation as reported to the trace sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_display_name: Option<String>,
    pub category: OperationCategory,
    pub details: OperationDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<OperationId>,
}

impl OperationDescriptor {
    /// Outer operation wrapping the whole configuration of a project.
    #[must_use]
    pub fn configure_project(identity: &ProjectIdentity) -> Self {
        Self {
            display_name: format!("Configure project {}", identity.identity_path()),
            progress_display_name: None,
            category: OperationCategory::ConfigureProject,
            details: identity.into(),
            parent: None,
        }
    }

    #[must_use]
    pub fn before_evaluate_hooks(identity: &ProjectIdentity) -> Self {
        Self::hooks(identity, "beforeEvaluate", OperationCategory::BeforeEvaluateHooks)
    }

    #[must_use]
    pub fn after_evaluate_hooks(identity: &ProjectIdentity) -> Self {
        Self::hooks(identity, "afterEvaluate", OperationCategory::AfterEvaluateHooks)
    }

    fn hooks(identity: &ProjectIdentity, event: &str, category: OperationCategory) -> Self {
        let suffix = format!(" ({})", identity.identity_path());
        Self {
            display_name: format!("Execute {event} hooks{suffix}"),
            progress_display_name: Some(format!("Executing {event} hooks{suffix}")),
            category,
            details: identity.into(),
            parent: None,
        }
    }

    /// Nest this operation under `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: OperationId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Phase-specific success payload of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationResult {
    ConfigureProject,
    BeforeEvaluateHooks {
        /// Listeners notified, including ones registered during the dispatch.
        listeners_notified: usize,
    },
    AfterEvaluateHooks {
        listeners_notified: usize,
    },
}

impl OperationResult {
    #[must_use]
    pub const fn category(&self) -> OperationCategory {
        match self {
            Self::ConfigureProject => OperationCategory::ConfigureProject,
            Self::BeforeEvaluateHooks { .. } => OperationCategory::BeforeEvaluateHooks,
            Self::AfterEvaluateHooks { .. } => OperationCategory::AfterEvaluateHooks,
        }
    }
}
