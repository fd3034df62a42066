//! Detection configuration
//!
//! The timeouts are tuned for slow-starting hardware. Their absolute values
//! may change but the first-byte timeout must not be shorter than the
//! per-byte timeout that follows it.

use serde::{Deserialize, Serialize};
use sermouse_transport::{LineParameters, Verbosity};
use std::time::Duration;

use crate::commands::{BAUD_COMMANDS, ReportRate};
use crate::{DetectError, DetectResult};

/// Most bytes a handshake probe will accumulate.
pub const MAX_HANDSHAKE_BYTES: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub verbosity: Verbosity,
    /// Run the handshake probe for self-identifying devices.
    pub handshake_probe: bool,
    /// Run the echo-probe baud sweep for prompt-mode devices.
    pub echo_probe: bool,
    /// Wait for the first handshake byte (milliseconds).
    pub first_byte_timeout_ms: u64,
    /// Wait for each later handshake byte (milliseconds).
    pub next_byte_timeout_ms: u64,
    /// Wait for the status reply at each candidate baud (milliseconds).
    pub echo_timeout_ms: u64,
    pub max_handshake_bytes: usize,
    pub baud_candidates: Vec<u32>,
    /// Time the device is held unpowered before the handshake (milliseconds).
    pub power_off_delay_ms: u64,
    /// Time a freshly powered device needs before it answers (milliseconds).
    pub power_on_delay_ms: u64,
    /// Button count assumed when the device gives no usable answer.
    pub default_buttons: u8,
    pub query_button_count: bool,
    /// Baud rate prompt-mode devices are switched to before streaming.
    pub default_baud: u32,
    pub default_report_rate: ReportRate,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            handshake_probe: true,
            echo_probe: true,
            first_byte_timeout_ms: 200,
            next_byte_timeout_ms: 100,
            echo_timeout_ms: 50,
            max_handshake_bytes: MAX_HANDSHAKE_BYTES,
            baud_candidates: vec![1200, 2400, 4800, 9600],
            power_off_delay_ms: 100,
            power_on_delay_ms: 200,
            default_buttons: 2,
            query_button_count: true,
            default_baud: 1200,
            default_report_rate: ReportRate::Continuous,
        }
    }
}

impl DetectionConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> DetectResult<()> {
        if self.next_byte_timeout_ms == 0 {
            return Err(DetectError::invalid_configuration(
                "next_byte_timeout_ms must be greater than 0",
            ));
        }
        if self.first_byte_timeout_ms < self.next_byte_timeout_ms {
            return Err(DetectError::invalid_configuration(
                "first_byte_timeout_ms must not be shorter than next_byte_timeout_ms",
            ));
        }
        if self.echo_timeout_ms == 0 {
            return Err(DetectError::invalid_configuration(
                "echo_timeout_ms must be greater than 0",
            ));
        }
        if !(1..=MAX_HANDSHAKE_BYTES).contains(&self.max_handshake_bytes) {
            return Err(DetectError::invalid_configuration(format!(
                "max_handshake_bytes must be in 1..={MAX_HANDSHAKE_BYTES}"
            )));
        }
        if self.baud_candidates.is_empty() || self.baud_candidates.contains(&0) {
            return Err(DetectError::invalid_configuration(
                "baud_candidates must be non-empty and non-zero",
            ));
        }
        if !(2..=3).contains(&self.default_buttons) {
            return Err(DetectError::invalid_configuration(
                "default_buttons must be 2 or 3",
            ));
        }
        if !BAUD_COMMANDS.iter().any(|(rate, _)| *rate == self.default_baud) {
            return Err(DetectError::UnsupportedBaud(self.default_baud));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> DetectionConfigBuilder {
        DetectionConfigBuilder::default()
    }

    pub fn first_byte_timeout(&self) -> Duration {
        Duration::from_millis(self.first_byte_timeout_ms)
    }

    pub fn next_byte_timeout(&self) -> Duration {
        Duration::from_millis(self.next_byte_timeout_ms)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }

    pub fn power_off_delay(&self) -> Duration {
        Duration::from_millis(self.power_off_delay_ms)
    }

    pub fn power_on_delay(&self) -> Duration {
        Duration::from_millis(self.power_on_delay_ms)
    }

    /// Upper bound on a detection pass over a line that never answers.
    ///
    /// Covers the power cycle, the first-byte timeout, one power-on delay
    /// and, at each candidate baud, the prompt and status commands on the
    /// wire plus the echo timeout.
    pub fn worst_case_duration(&self) -> Duration {
        let mut total = Duration::ZERO;
        if self.handshake_probe {
            total += self.power_off_delay() + self.first_byte_timeout();
        }
        if self.echo_probe {
            total += self.power_on_delay();
            for &baud in &self.baud_candidates {
                let wire = LineParameters::eight_o_one(baud).char_time() * 2;
                total += wire + self.echo_timeout();
            }
        }
        total
    }
}

/// Builder for `DetectionConfig`.
#[derive(Debug, Default)]
pub struct DetectionConfigBuilder {
    config: DetectionConfig,
}

impl DetectionConfigBuilder {
    #[must_use]
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn handshake_probe(mut self, enabled: bool) -> Self {
        self.config.handshake_probe = enabled;
        self
    }

    #[must_use]
    pub fn echo_probe(mut self, enabled: bool) -> Self {
        self.config.echo_probe = enabled;
        self
    }

    /// Set both handshake timeouts in milliseconds.
    #[must_use]
    pub fn handshake_timeouts_ms(mut self, first: u64, next: u64) -> Self {
        self.config.first_byte_timeout_ms = first;
        self.config.next_byte_timeout_ms = next;
        self
    }

    #[must_use]
    pub fn echo_timeout_ms(mut self, ms: u64) -> Self {
        self.config.echo_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn max_handshake_bytes(mut self, count: usize) -> Self {
        self.config.max_handshake_bytes = count;
        self
    }

    #[must_use]
    pub fn baud_candidates(mut self, candidates: impl Into<Vec<u32>>) -> Self {
        self.config.baud_candidates = candidates.into();
        self
    }

    #[must_use]
    pub fn power_delays_ms(mut self, off: u64, on: u64) -> Self {
        self.config.power_off_delay_ms = off;
        self.config.power_on_delay_ms = on;
        self
    }

    #[must_use]
    pub fn default_buttons(mut self, count: u8) -> Self {
        self.config.default_buttons = count;
        self
    }

    #[must_use]
    pub fn query_button_count(mut self, enabled: bool) -> Self {
        self.config.query_button_count = enabled;
        self
    }

    #[must_use]
    pub fn default_baud(mut self, baud: u32) -> Self {
        self.config.default_baud = baud;
        self
    }

    #[must_use]
    pub fn default_report_rate(mut self, rate: ReportRate) -> Self {
        self.config.default_report_rate = rate;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> DetectResult<DetectionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DetectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_timeout_ordering_enforced() {
        let result = DetectionConfig::builder().handshake_timeouts_ms(50, 100).build();
        assert!(matches!(result, Err(DetectError::InvalidConfiguration(_))));

        let result = DetectionConfig::builder().handshake_timeouts_ms(100, 100).build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(DetectionConfig::builder().echo_timeout_ms(0).build().is_err());
        assert!(DetectionConfig::builder().max_handshake_bytes(0).build().is_err());
        assert!(DetectionConfig::builder().max_handshake_bytes(256).build().is_err());
        assert!(DetectionConfig::builder().baud_candidates(vec![]).build().is_err());
        assert!(DetectionConfig::builder().default_buttons(5).build().is_err());
        assert_eq!(
            DetectionConfig::builder().default_baud(19200).build(),
            Err(DetectError::UnsupportedBaud(19200))
        );
    }

    #[test]
    fn test_worst_case_duration() {
        let config = DetectionConfig::builder()
            .echo_probe(false)
            .build()
            .unwrap_or_default();
        assert_eq!(config.worst_case_duration(), Duration::from_millis(300));

        let config = DetectionConfig::default();
        assert!(config.worst_case_duration() > Duration::from_millis(300 + 200 + 4 * 50));
    }

    #[test]
    fn test_partial_json_uses_defaults() -> Result<(), serde_json::Error> {
        let config: DetectionConfig = serde_json::from_str(r#"{ "echo_timeout_ms": 80 }"#)?;
        assert_eq!(config.echo_timeout_ms, 80);
        assert_eq!(config.first_byte_timeout_ms, 200);
        assert_eq!(config.baud_candidates, vec![1200, 2400, 4800, 9600]);
        Ok(())
    }
}
