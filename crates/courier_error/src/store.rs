//! Channel store error types.

/// Result type for channel store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Specific channel store error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StoreErrorKind {
    /// Reading or writing the backing file failed.
    #[display("I/O error on {}: {}", path, message)]
    Io {
        /// Path of the backing file.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Stored data could not be encoded or decoded.
    #[display("Serialization error: {}", _0)]
    Serialization(String),
    /// The store cannot be reached.
    #[display("Store unavailable: {}", _0)]
    Unavailable(String),
}

/// Channel store error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The error kind
    pub kind: StoreErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoreErrorKind {
        &self.kind
    }
}
