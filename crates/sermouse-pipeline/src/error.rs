//! Error types for the acquisition pipeline.

use sermouse_detect::DetectError;
use sermouse_transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`crate::SerialMouse`] lifecycle calls.
///
/// Steady-state failures never appear here: the read pump and the removal
/// watcher report them through [`crate::InputSink::notify_removal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A configuration document could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// `on_attach` or `resume` called while the device is running.
    #[error("Device already started")]
    AlreadyStarted,

    /// Completion callbacks were still running when the drain timeout ran out.
    #[error("Timed out after {0:?} waiting for outstanding requests")]
    TeardownTimeout(Duration),
}

impl PipelineError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a configuration load error.
    #[must_use]
    pub fn config_load(reason: impl Into<String>) -> Self {
        Self::ConfigLoad(reason.into())
    }
}

/// A specialized `Result` type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
