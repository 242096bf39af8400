//! Core identity types shared across projeval crates.
//!
//! Projects are addressed by colon-separated paths (`:`, `:app`, `:libs:core`).
//! A project's *identity path* is its project path prefixed with the identity
//! path of the build that owns it, so projects from different builds never
//! collide in logs or trace output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

const SEPARATOR: char = ':';

/// A colon-separated, absolute path identifying a project or a build.
///
/// The root path is `:`. Every other path starts with `:` and has non-empty
/// segments without whitespace.
///
/// # Example
///
/// ```rust
/// use projeval_utils::types::ProjectPath;
///
/// let app: ProjectPath = ":app".parse().unwrap();
/// let core = app.child("core").unwrap();
/// assert_eq!(core.as_str(), ":app:core");
/// assert_eq!(core.name(), Some("core"));
/// assert_eq!(core.parent(), Some(app));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectPath(String);

impl ProjectPath {
    /// The root path `:`.
    #[must_use]
    pub fn root() -> Self {
        Self(SEPARATOR.to_string())
    }

    /// Parse and validate a path string.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidProjectPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw == ":" {
            return Ok(Self::root());
        }
        let Some(rest) = raw.strip_prefix(SEPARATOR) else {
            return Err(invalid("path must start with ':'"));
        };
        for segment in rest.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(invalid("path segments must not be empty"));
            }
            if segment.chars().any(char::is_whitespace) {
                return Err(invalid("path segments must not contain whitespace"));
            }
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the path, `None` for the root.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit(SEPARATOR).next()
        }
    }

    /// Enclosing path, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
        }
    }

    /// Path segments in order, empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments; the root has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Append a single segment.
    pub fn child(&self, name: &str) -> Result<Self, ConfigError> {
        if self.is_root() {
            Self::parse(&format!(":{name}"))
        } else {
            Self::parse(&format!("{}:{name}", self.0))
        }
    }

    /// Concatenate two absolute paths, treating the root as the identity.
    #[must_use]
    pub fn append(&self, other: &ProjectPath) -> Self {
        if self.is_root() {
            other.clone()
        } else if other.is_root() {
            self.clone()
        } else {
            Self(format!("{}{}", self.0, other.0))
        }
    }
}

impl Default for ProjectPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProjectPath {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProjectPath> for String {
    fn from(path: ProjectPath) -> Self {
        path.0
    }
}

/// Identity of a project within a build tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectIdentity {
    /// Identity path of the build that owns the project (`:` for the root build).
    pub build_path: ProjectPath,
    /// Path of the project inside its build.
    pub project_path: ProjectPath,
    /// Simple name of the project.
    pub name: String,
}

impl ProjectIdentity {
    /// Create an identity; the name defaults to the last path segment, or
    /// `root_name` for the root project.
    #[must_use]
    pub fn new(build_path: ProjectPath, project_path: ProjectPath, root_name: &str) -> Self {
        let name = project_path.name().unwrap_or(root_name).to_string();
        Self {
            build_path,
            project_path,
            name,
        }
    }

    /// Build identity path followed by the project path.
    #[must_use]
    pub fn identity_path(&self) -> ProjectPath {
        self.build_path.append(&self.project_path)
    }

    /// Human readable name used in failure messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.project_path.is_root() && self.build_path.is_root() {
            format!("root project '{}'", self.name)
        } else {
            format!("project '{}'", self.identity_path())
        }
    }
}

impl fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity_path())
    }
}

/// How much diagnostic detail to log for secondary failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShowStacktrace {
    /// Only internal errors carry their full cause chain.
    #[default]
    InternalExceptions,
    /// Always log the full cause chain.
    Always,
    /// Always log the full cause chain, including debug representations.
    AlwaysFull,
}

impl ShowStacktrace {
    /// Whether secondary failures should be logged with their cause chain.
    #[must_use]
    pub const fn logs_stacktraces(self) -> bool {
        !matches!(self, Self::InternalExceptions)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InternalExceptions => "internal-exceptions",
            Self::Always => "always",
            Self::AlwaysFull => "always-full",
        }
    }
}

impl fmt::Display for ShowStacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShowStacktrace {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal-exceptions" => Ok(Self::InternalExceptions),
            "always" => Ok(Self::Always),
            "always-full" => Ok(Self::AlwaysFull),
            other => Err(ConfigError::InvalidValue {
                key: "show_stacktrace".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> ProjectPath {
        ProjectPath::parse(raw).unwrap()
    }

    #[test]
    fn test_root_path() {
        let root = ProjectPath::root();
        assert!(root.is_root());
        assert_eq!(root.as_str(), ":");
        assert_eq!(root.name(), None);
        assert_eq!(root.parent(), None);
        assert_eq!(root.depth(), 0);
        assert_eq!(path(":"), root);
    }

    #[test]
    fn test_rejects_malformed_paths() {
        for raw in ["", "app", "::app", ":app:", ":app::core", ": app"] {
            let err = ProjectPath::parse(raw).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidProjectPath { .. }),
                "expected rejection for {raw:?}"
            );
        }
    }

    #[test]
    fn test_nested_path_navigation() {
        let core = path(":libs:core");
        assert_eq!(core.name(), Some("core"));
        assert_eq!(core.parent(), Some(path(":libs")));
        assert_eq!(path(":libs").parent(), Some(ProjectPath::root()));
        assert_eq!(core.segments().collect::<Vec<_>>(), vec!["libs", "core"]);
        assert_eq!(core.depth(), 2);
    }

    #[test]
    fn test_child_and_append() {
        assert_eq!(ProjectPath::root().child("app").unwrap(), path(":app"));
        assert_eq!(path(":app").child("core").unwrap(), path(":app:core"));
        assert!(path(":app").child("bad name").is_err());

        assert_eq!(ProjectPath::root().append(&path(":app")), path(":app"));
        assert_eq!(path(":included").append(&ProjectPath::root()), path(":included"));
        assert_eq!(path(":included").append(&path(":app")), path(":included:app"));
    }

    #[test]
    fn test_serde_validates_paths() {
        let json = serde_json::to_string(&path(":app")).unwrap();
        assert_eq!(json, r#"":app""#);

        let parsed: ProjectPath = serde_json::from_str(r#"":a:b""#).unwrap();
        assert_eq!(parsed, path(":a:b"));
        assert!(serde_json::from_str::<ProjectPath>(r#""a:b""#).is_err());
    }

    #[test]
    fn test_identity_display_names() {
        let root = ProjectIdentity::new(ProjectPath::root(), ProjectPath::root(), "acme");
        assert_eq!(root.name, "acme");
        assert_eq!(root.display_name(), "root project 'acme'");
        assert_eq!(root.identity_path(), ProjectPath::root());

        let app = ProjectIdentity::new(ProjectPath::root(), path(":app"), "acme");
        assert_eq!(app.name, "app");
        assert_eq!(app.display_name(), "project ':app'");

        let included = ProjectIdentity::new(path(":plugins"), path(":app"), "acme");
        assert_eq!(included.identity_path(), path(":plugins:app"));
        assert_eq!(included.to_string(), ":plugins:app");
        assert_eq!(included.display_name(), "project ':plugins:app'");
    }

    #[test]
    fn test_show_stacktrace_levels() {
        assert_eq!(ShowStacktrace::default(), ShowStacktrace::InternalExceptions);
        assert!(!ShowStacktrace::InternalExceptions.logs_stacktraces());
        assert!(ShowStacktrace::Always.logs_stacktraces());
        assert!(ShowStacktrace::AlwaysFull.logs_stacktraces());

        for level in [
            ShowStacktrace::InternalExceptions,
            ShowStacktrace::Always,
            ShowStacktrace::AlwaysFull,
        ] {
            assert_eq!(level.as_str().parse::<ShowStacktrace>().unwrap(), level);
        }
        assert!("verbose".parse::<ShowStacktrace>().is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_parent_of_child_is_self(segments in proptest::collection::vec("[a-z][a-z0-9_-]{0,8}", 0..5), leaf in "[a-z][a-z0-9]{0,8}") {
            let mut current = ProjectPath::root();
            for segment in &segments {
                current = current.child(segment).unwrap();
            }
            let child = current.child(&leaf).unwrap();
            proptest::prop_assert_eq!(child.parent(), Some(current.clone()));
            proptest::prop_assert_eq!(child.depth(), segments.len() + 1);
            proptest::prop_assert_eq!(ProjectPath::parse(child.as_str()).unwrap(), child);
        }
    }
}
