//! Configuration error types.

/// Configuration or settings error, tagged with where it was raised.
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
    /// Error raised at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier_error::ConfigError;
    ///
    /// let err = ConfigError::new("No dump channel set");
    /// assert!(err.message.contains("dump channel"));
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

    /// A setting holds a value the relay cannot run with.
    ///
    /// ```
    /// use courier_error::ConfigError;
    ///
    /// let err = ConfigError::out_of_range("progress_every", "at least 1");
    /// assert_eq!(err.message, "progress_every must be at least 1");
    /// ```
    #[track_caller]
    pub fn out_of_range(field: &str, requirement: &str) -> Self {
        Self::new(format!("{field} must be {requirement}"))
    }
}
