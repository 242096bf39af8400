//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Installs the tracing subscriber
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{Config, ExitCode, ProjevalError};
use projeval_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// This function handles ALL output including errors. It returns `Result<(), ExitCode>`:
/// - On success: returns `Ok(())` after printing any output
/// - On error: prints a user-facing report and returns `Err(ExitCode)`
///
/// main.rs only calls `std::process::exit(code.as_i32())` on error - it does NOT print.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    let cli_args = cli.cli_args();

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("⚠ Failed to initialize logging: {e}");
    }

    let operation = cli.operation();
    tracing::debug!(operation, "Dispatching command");

    let result = match cli.command {
        Commands::Configure { projects, json, .. } => {
            commands::execute_configure_command(&config, &projects, json)
        }
        Commands::Projects { json } => commands::execute_projects_command(&config, json),
        Commands::Config { json } => commands::execute_config_command(&config, json),
    };

    if let Err(error) = result {
        if let Some(projeval_error) = error.downcast_ref::<ProjevalError>() {
            eprintln!("{}", projeval_error.display_for_user());
            return Err(projeval_error.to_exit_code());
        }

        eprintln!("✗ Unexpected error during {operation}: {error:#}");
        eprintln!("\n  General troubleshooting:");
        eprintln!("    - Run with --verbose for more detailed output");
        eprintln!("    - Run 'projeval config' to check the effective configuration");
        return Err(ExitCode::INTERNAL);
    }

    Ok(())
}
