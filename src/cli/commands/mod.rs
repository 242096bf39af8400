//! CLI command implementations.
//!
//! This module re-exports the command surface used by `run.rs`.
//! Implementations live in `commands/*`.

mod config;
mod configure;
mod json_emit;
mod projects;

pub use config::execute_config_command;
pub use configure::execute_configure_command;
pub use projects::execute_projects_command;
