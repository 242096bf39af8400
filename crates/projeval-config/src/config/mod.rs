//! Configuration management for projeval
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. Configuration files are TOML with `[defaults]`,
//! `[build]`, `[projects]` and `[hooks]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::{CONFIG_DIR, CONFIG_ENV, CONFIG_FILE};
pub use model::*;
