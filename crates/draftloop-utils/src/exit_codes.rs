//! Exit code constants for draftloop.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 10 | `STAGE_TIMEOUT` | Stage execution timed out |
//! | 70 | `PROVIDER_FAILURE` | Text generation provider failed |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) for
/// `std::process::exit()`.
///
/// ```rust
/// use draftloop_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::STAGE_TIMEOUT, ExitCode::from_i32(10));
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

    /// Stage timeout - a stage exceeded its configured timeout
    pub const STAGE_TIMEOUT: ExitCode = ExitCode(10);

    /// Provider failure - the text generation provider could not be used
    pub const PROVIDER_FAILURE: ExitCode = ExitCode(70);

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::STAGE_TIMEOUT.as_i32(), 10);
        assert_eq!(ExitCode::PROVIDER_FAILURE.as_i32(), 70);
    }

    #[test]
    fn test_exit_code_conversions() {
        let code: ExitCode = 70.into();
        assert_eq!(code, ExitCode::PROVIDER_FAILURE);
        let raw: i32 = ExitCode::CLI_ARGS.into();
        assert_eq!(raw, 2);
    }
}
