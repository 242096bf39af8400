//! Listener dispatch and command hooks for projeval.
//!
//! [`ListenerBroadcaster`] is the ordered, re-entrancy safe listener list each
//! project owns. The remaining types run configured shell commands as hooks:
//! a command is executed with project context, and its `on_fail` policy
//! decides whether a failure is a warning or a listener error.

mod broadcaster;
mod executor;
mod outcome;

pub use broadcaster::ListenerBroadcaster;
pub use executor::{CommandExecutor, HookContext, HookResult, HookType};
pub use outcome::{HookOutcome, HookWarning, execute_and_process_hook, process_hook_result};
