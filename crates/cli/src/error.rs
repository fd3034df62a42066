//! Error types for sermousectl

use sermouse_detect::DetectError;
use sermouse_pipeline::PipelineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No device detected: {0}")]
    NoDeviceDetected(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(PipelineError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::NoDeviceDetected(_) => 3,
            CliError::InvalidInput(_) | CliError::InvalidConfiguration(_) | CliError::JsonError(_) => 4,
            CliError::IoError(_) => 5,
            CliError::Pipeline(_) => 6,
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::InvalidConfiguration(_)
            | PipelineError::ConfigLoad(_)
            | PipelineError::Detect(DetectError::InvalidConfiguration(_))
            | PipelineError::Detect(DetectError::UnsupportedBaud(_)) => {
                CliError::InvalidConfiguration(error.to_string())
            }
            other => CliError::Pipeline(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sermouse_transport::TransportError;

    #[test]
    fn test_config_errors_map_to_invalid_configuration() {
        let error = CliError::from(PipelineError::Detect(DetectError::UnsupportedBaud(300)));
        assert!(matches!(error, CliError::InvalidConfiguration(_)));
        assert_eq!(error.exit_code(), 4);
    }

    #[test]
    fn test_runtime_errors_stay_pipeline_errors() {
        let error = CliError::from(PipelineError::Transport(TransportError::NotOpen));
        assert!(matches!(error, CliError::Pipeline(_)));
        assert_eq!(error.exit_code(), 6);
    }
}
