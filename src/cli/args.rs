//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use projeval_config::CliArgs;
use projeval_utils::types::{ProjectPath, ShowStacktrace};

/// projeval - project configuration lifecycle engine
#[derive(Parser)]
#[command(name = "projeval")]
#[command(about = "Configure build projects with before/after evaluate hooks and traced operations")]
#[command(long_about = r#"
projeval configures the projects of a build. Each project runs its
beforeEvaluate hooks, its configure command and its afterEvaluate hooks,
and every step is reported as an instrumented operation.

EXAMPLES:
  # Configure every project
  projeval configure

  # Configure two projects one after another, with full error detail
  projeval configure :app :lib --serial --stacktrace

  # Write the operation trace as canonical JSON
  projeval configure --trace-file build/projeval-trace.json

  # List configured projects
  projeval projects --json

  # Show the effective configuration and where each value came from
  projeval config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .projeval/config.toml
  Use --config or PROJEVAL_CONFIG to specify an explicit config file path

EXIT CODES:
  0  all requested projects configured
  1  internal error
  2  invalid arguments or configuration
  3  at least one project failed to configure
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure projects and report per-project outcomes
    Configure {
        /// Project paths to configure, e.g. `:app` (default: every project)
        projects: Vec<ProjectPath>,

        /// Configure projects one after another instead of in parallel
        #[arg(long)]
        serial: bool,

        /// Log secondary afterEvaluate failures with their full cause chain
        #[arg(long, conflicts_with = "full_stacktrace")]
        stacktrace: bool,

        /// Like --stacktrace, including debug representations
        #[arg(long)]
        full_stacktrace: bool,

        /// Write the operation trace to this file
        #[arg(long)]
        trace_file: Option<String>,

        /// Output the configuration report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured projects and their hooks
    Projects {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration with source attribution
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Overrides for the configuration system.
    #[must_use]
    pub fn cli_args(&self) -> CliArgs {
        let mut args = CliArgs {
            config_path: self.config.clone(),
            verbose: self.verbose.then_some(true),
            ..CliArgs::default()
        };

        if let Commands::Configure {
            serial,
            stacktrace,
            full_stacktrace,
            trace_file,
            ..
        } = &self.command
        {
            args.parallel = serial.then_some(false);
            args.show_stacktrace = if *full_stacktrace {
                Some(ShowStacktrace::AlwaysFull)
            } else if *stacktrace {
                Some(ShowStacktrace::Always)
            } else {
                None
            };
            args.trace_file.clone_from(trace_file);
        }

        args
    }

    /// Operation name used in error reports.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self.command {
            Commands::Configure { .. } => "configure",
            Commands::Projects { .. } => "projects",
            Commands::Config { .. } => "config",
        }
    }
}

/// Build the clap command, for tests and documentation tooling.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
