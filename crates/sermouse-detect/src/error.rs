//! Error types for detection.

use sermouse_transport::TransportError;
use thiserror::Error;

/// Errors that abort a detection pass.
///
/// Finding no device is not an error; [`crate::DetectionEngine::detect`]
/// reports it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    /// Invalid configuration provided.
    #[error("Invalid detection configuration: {0}")]
    InvalidConfiguration(String),

    /// The transport failed while probing.
    #[error("Transport failed during detection: {0}")]
    Transport(#[from] TransportError),

    /// No command exists to switch the device to this baud rate.
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaud(u32),
}

impl DetectError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

/// A specialized `Result` type for detection.
pub type DetectResult<T> = std::result::Result<T, DetectError>;
