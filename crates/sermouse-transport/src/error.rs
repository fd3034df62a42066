//! Error types for transport operations.

use thiserror::Error;

/// Errors reported by a [`crate::SerialTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// A timed read saw no byte within its timeout.
    #[error("Timed out waiting for data")]
    Timeout,

    /// The underlying port failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The port has not been opened, or has been closed.
    #[error("Transport is not open")]
    NotOpen,

    /// The device or port is gone.
    #[error("Device disconnected")]
    Disconnected,
}

impl TransportError {
    /// Create an I/O error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }

    /// True for a clean cancellation, which is never a removal signal.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True for a timed read that saw nothing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;
