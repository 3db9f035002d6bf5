//! Top-level error wrapper types.

use crate::{ConfigError, ForwardError, NotifyError, StoreError};

/// Every error condition the Courier crates can produce.
///
/// # Examples
///
/// ```
/// use courier_error::{CourierError, ConfigError};
///
/// let err: CourierError = ConfigError::new("No destination set").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum CourierErrorKind {
    /// Messaging provider error
    #[from(ForwardError)]
    Forward(ForwardError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Channel store error
    #[from(StoreError)]
    Store(StoreError),
    /// Notification sink error
    #[from(NotifyError)]
    Notify(NotifyError),
}

/// Courier error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Courier Error: {}", _0)]
pub struct CourierError(Box<CourierErrorKind>);

impl CourierError {
    /// Create a new error from a kind.
    pub fn new(kind: CourierErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CourierErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to CourierErrorKind
impl<T> From<T> for CourierError
where
    T: Into<CourierErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Courier operations.
pub type CourierResult<T> = std::result::Result<T, CourierError>;
