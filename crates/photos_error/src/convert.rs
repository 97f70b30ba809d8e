//! External converter error types.

/// Ways an external conversion tool can fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConvertErrorKind {
    /// The process could not be started
    #[display("Failed to spawn {}: {}", binary, reason)]
    Spawn {
        /// Binary that was invoked
        binary: String,
        /// Underlying I/O error text
        reason: String,
    },
    /// The process exited unsuccessfully
    #[display("{} exited with status {:?}: {}", binary, code, stderr)]
    ExitStatus {
        /// Binary that was invoked
        binary: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },
    /// The process did not finish within the configured timeout
    #[display("{} timed out after {} seconds", binary, seconds)]
    Timeout {
        /// Binary that was invoked
        binary: String,
        /// Configured timeout
        seconds: u64,
    },
}

/// Converter error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Convert Error: {} at line {} in {}", kind, line, file)]
pub struct ConvertError {
    /// The kind of error that occurred
    pub kind: ConvertErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ConvertError {
    /// Create a new converter error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConvertErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
