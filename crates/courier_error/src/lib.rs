//! Error types for the Courier relay.
//!
//! This crate provides the foundation error types used throughout the Courier workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use courier_error::{CourierResult, ConfigError};
//!
//! fn destination() -> CourierResult<i64> {
//!     Err(ConfigError::new("No destination set"))?
//! }
//!
//! assert!(destination().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod forward;
mod notify;
mod store;

pub use config::ConfigError;
pub use error::{CourierError, CourierErrorKind, CourierResult};
pub use forward::{ForwardError, ForwardErrorKind, ForwardResult};
pub use notify::NotifyError;
pub use store::{StoreError, StoreErrorKind, StoreResult};
