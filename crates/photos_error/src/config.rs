//! Configuration error types.

/// Configuration error with source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use photos_error::ConfigError;
    ///
    /// let err = ConfigError::new("Missing config entry: media_path");
    /// assert!(err.message.contains("media_path"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// A required setting is absent.
    #[track_caller]
    pub fn missing(key: &str) -> Self {
        Self::new(format!("Missing config entry: {}", key))
    }

    /// A required setting is present but blank.
    #[track_caller]
    pub fn empty(key: &str) -> Self {
        Self::new(format!("Empty config entry: {}", key))
    }
}
