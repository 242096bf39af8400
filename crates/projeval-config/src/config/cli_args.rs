use std::path::PathBuf;

use projeval_utils::types::ShowStacktrace;

/// Command-line overrides applied on top of file and default values.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit configuration file, bypassing discovery.
    pub config_path: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub show_stacktrace: Option<ShowStacktrace>,
    pub parallel: Option<bool>,
    pub trace_file: Option<String>,
}
