//! Configuration model, discovery, and validation for projeval.

pub mod config;

pub use config::{
    ALL_PROJECTS, BuildConfig, CONFIG_DIR, CONFIG_ENV, CONFIG_FILE, CliArgs, Config,
    ConfigBuilder, ConfigSource, DEFAULT_BUILD_NAME, DEFAULT_HOOK_TIMEOUT_SECS, Defaults,
    HookConfig, HookEvent, HooksConfig, OnFail, ProjectConfig,
};
