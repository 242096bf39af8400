//! Config command implementation
//!
//! Handles `projeval config` and `projeval config --json`.

use anyhow::Result;

use super::json_emit::{ConfigJsonOutput, emit_jcs};
use crate::Config;

/// Execute the config command
pub fn execute_config_command(config: &Config, json: bool) -> Result<()> {
    let effective_config = config.effective_config();

    if json {
        println!("{}", emit_jcs(&ConfigJsonOutput::new(effective_config))?);
        return Ok(());
    }

    match &config.root_dir {
        Some(root) => println!("Build root: {}", root.display()),
        None => println!("Build root: (current directory, no config file found)"),
    }
    println!("\n  Effective configuration:");
    for (key, (value, source)) in effective_config {
        println!("    {key} = {value} (from {source})");
    }
    Ok(())
}
