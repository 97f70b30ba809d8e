//! Chat transport error types.

/// Specific transport error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TransportErrorKind {
    /// Could not reach or log in to the homeserver
    #[display("Connection failed: {}", _0)]
    ConnectionFailed(String),
    /// The server reports a different user or device than configured
    #[display("Identity mismatch: configured {}, but server said {}", configured, reported)]
    IdentityMismatch {
        /// Configured identifier
        configured: String,
        /// Identifier reported by the server
        reported: String,
    },
    /// Failed to download or decrypt an attachment
    #[display("Failed to download media: {}", _0)]
    Download(String),
    /// The connection or event queue is gone
    #[display("Channel closed: {}", _0)]
    Closed(String),
    /// Malformed inbound event
    #[display("Invalid event: {}", _0)]
    InvalidEvent(String),
}

impl TransportErrorKind {
    /// Whether retrying the operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportErrorKind::ConnectionFailed(_) | TransportErrorKind::Download(_)
        )
    }
}

/// Transport error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error: {} at line {} in {}", kind, line, file)]
pub struct TransportError {
    /// The kind of error that occurred
    pub kind: TransportErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TransportError {
    /// Create a new transport error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
