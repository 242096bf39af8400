//! Exit code constants for the projeval CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | All requested projects configured successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `CONFIGURATION_FAILED` | At least one project failed to configure |

/// Exit codes matching the documented exit code table.
///
/// # Example
///
/// ```rust
/// use projeval_utils::exit_codes::ExitCode;
///
/// let code = ExitCode::CONFIGURATION_FAILED;
/// assert_eq!(code.as_i32(), 3);
/// assert_eq!(ExitCode::SUCCESS, ExitCode::from_i32(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// A project's configuration failed
    pub const CONFIGURATION_FAILED: ExitCode = ExitCode(3);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    /// Stable name for JSON output, `None` for codes outside the table.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("success"),
            1 => Some("internal"),
            2 => Some("cli_args"),
            3 => Some("configuration_failed"),
            _ => None,
        }
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
