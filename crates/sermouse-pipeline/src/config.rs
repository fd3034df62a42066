//! Pipeline and device configuration

use serde::{Deserialize, Serialize};
use sermouse_detect::DetectionConfig;
use sermouse_transport::Verbosity;
use std::path::Path;
use std::time::Duration;

use crate::{PipelineError, PipelineResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub verbosity: Verbosity,
    /// Start the removal watcher on attach.
    pub watch_removal: bool,
    /// Take one enable reference on attach so reading starts immediately.
    pub enable_on_attach: bool,
    /// Longest teardown waits for in-flight completions (milliseconds).
    pub drain_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            watch_removal: true,
            enable_on_attach: true,
            drain_timeout_ms: 5000,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.drain_timeout_ms == 0 {
            return Err(PipelineError::invalid_configuration(
                "drain_timeout_ms must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Builder for `PipelineConfig`.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    #[must_use]
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn watch_removal(mut self, enabled: bool) -> Self {
        self.config.watch_removal = enabled;
        self
    }

    #[must_use]
    pub fn enable_on_attach(mut self, enabled: bool) -> Self {
        self.config.enable_on_attach = enabled;
        self
    }

    #[must_use]
    pub fn drain_timeout_ms(mut self, ms: u64) -> Self {
        self.config.drain_timeout_ms = ms;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> PipelineResult<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Everything one attached device needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    pub detection: DetectionConfig,
    pub pipeline: PipelineConfig,
}

impl MouseConfig {
    /// Validate both sections.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> PipelineResult<()> {
        self.detection.validate()?;
        self.pipeline.validate()
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or invalid.
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PipelineError::config_load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::config_load(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> PipelineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PipelineError::config_load(e.to_string()))
    }
}
