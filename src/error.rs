//! Error types.
//!
//! `DriverError` is what every driver call returns. The decorators never
//! construct a driver error themselves except for [`DriverError::Skip`], the
//! capability-absent sentinel; everything else is forwarded exactly as the
//! wrapped driver produced it.

use std::error::Error;

use thiserror::Error;

/// Result alias used across the driver contract.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors produced by a driver (or by a decorator standing in for one).
#[derive(Error, Debug)]
pub enum DriverError {
    /// The optional interface is not implemented; callers fall back to the
    /// legacy path as if the method did not exist.
    #[error("driver: skip fast-path; continue as if unimplemented")]
    Skip,

    /// The connection is unusable and should be discarded by the caller.
    #[error("driver: bad connection")]
    BadConn,

    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Raised by the legacy fallback path when an argument carries a name that
    /// positional binding would lose.
    #[error("driver does not support the use of named parameters (argument '{name}')")]
    NamedParamsUnsupported { name: String },

    /// Raised by the legacy begin path when isolation or read-only options
    /// would be silently dropped.
    #[error("driver does not support non-default transaction options")]
    TxOptionsUnsupported,

    #[error("{message}")]
    Failed { message: String },

    #[error(transparent)]
    Other(#[from] Box<dyn Error + Send + Sync>),
}

impl DriverError {
    /// Convenience constructor for driver implementations.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Whether this is the capability-absent sentinel.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }
}

/// Errors raised while building a logged database handle.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    ReadFailed { path: String, message: String },

    #[error("Invalid JSON in config file: {message}")]
    InvalidJson { message: String },

    /// The operating system could not seed the unique ID generator.
    #[error("Entropy source unavailable for unique ID generation: {message}")]
    EntropyUnavailable { message: String },
}
