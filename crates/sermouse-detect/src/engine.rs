//! Detection cascade
//!
//! Two probes run in order and the first match wins:
//!
//! 1. The handshake probe power-cycles the device at 1200 baud 7N1 and reads
//!    the identification bytes self-identifying devices send on power-up.
//! 2. The echo probe sweeps the candidate baud rates, putting the device in
//!    prompt mode and sending a status query at each until the expected
//!    status byte comes back.
//!
//! A match is followed by restoring the device to the configured default
//! baud and report rate, after which the read pump may take over.

use serde::{Deserialize, Serialize};
use sermouse_protocol::ProtocolKind;
use sermouse_transport::{LineParameters, ModemControl, SerialTransport, TransportError};
use tracing::{debug, info, trace};

use crate::commands::{BUTTON_QUERY, PROMPT_MODE, STATUS_OK, STATUS_QUERY, baud_command};
use crate::{DetectResult, DetectionConfig};

/// Line rate every self-identifying device uses.
pub const HANDSHAKE_BAUD: u32 = 1200;

/// What detection found. Frozen until the next detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectionResult {
    pub variant: ProtocolKind,
    pub button_count: u8,
    pub baud_rate: u32,
}

impl DetectionResult {
    /// Line format the read pump must use for this device.
    pub fn line_parameters(&self) -> LineParameters {
        LineParameters::for_protocol(self.variant, self.baud_rate)
    }
}

/// Finds the identification in bytes read after power-up.
///
/// Looks for the first `'M'` or `'B'`. `"M3"` is a three-button mouse,
/// `"MZ"` a wheel mouse, any other `'M'` a two-button mouse and `'B'` a
/// BallPoint.
pub fn scan_handshake(bytes: &[u8]) -> Option<(ProtocolKind, u8)> {
    let start = bytes.iter().position(|&b| b == b'M' || b == b'B')?;
    match bytes.get(start..)? {
        [b'B', ..] => Some((ProtocolKind::Bp, 2)),
        [b'M', b'3', ..] => Some((ProtocolKind::Mp, 3)),
        [b'M', b'Z', ..] => Some((ProtocolKind::Z, 3)),
        _ => Some((ProtocolKind::Mp, 2)),
    }
}

/// Runs the probes against a transport it owns for the duration.
pub struct DetectionEngine<'a> {
    transport: &'a dyn SerialTransport,
    config: DetectionConfig,
}

impl<'a> DetectionEngine<'a> {
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(transport: &'a dyn SerialTransport, config: DetectionConfig) -> DetectResult<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Identifies the attached device.
    ///
    /// Returns `Ok(None)` when neither probe gets an answer, which is the
    /// normal outcome for an empty port.
    ///
    /// # Errors
    ///
    /// Returns an error only when the transport itself fails. Timeouts are
    /// part of probing and never surface.
    pub fn detect(&self) -> DetectResult<Option<DetectionResult>> {
        let mut settled = false;

        if self.config.handshake_probe {
            let found = self.handshake_probe()?;
            settled = true;
            if let Some(found) = found {
                return self.restore_defaults(found).map(Some);
            }
        }

        if self.config.echo_probe {
            if let Some(found) = self.echo_probe(settled)? {
                return self.restore_defaults(found).map(Some);
            }
        }

        if self.config.verbosity.lifecycle() {
            info!("No serial mouse detected");
        }
        Ok(None)
    }

    fn handshake_probe(&self) -> DetectResult<Option<DetectionResult>> {
        let transport = self.transport;
        transport.set_line_parameters(LineParameters::seven_n_one(HANDSHAKE_BAUD))?;
        transport.set_modem_control(ModemControl::POWER_OFF)?;
        transport.delay(self.config.power_off_delay());
        transport.flush_input()?;
        transport.set_modem_control(ModemControl::POWER_ON)?;

        let bytes = self.read_handshake()?;
        debug!(count = bytes.len(), "Handshake bytes read");
        if self.config.verbosity.bytes() {
            trace!(bytes = ?bytes, "Handshake buffer");
        }

        match scan_handshake(&bytes) {
            Some((variant, button_count)) => Ok(Some(DetectionResult {
                variant,
                button_count,
                baud_rate: HANDSHAKE_BAUD,
            })),
            None => {
                // The device answered under some other assumption and may
                // still be starting up.
                if !bytes.is_empty() {
                    transport.delay(self.config.power_on_delay());
                }
                Ok(None)
            }
        }
    }

    fn read_handshake(&self) -> DetectResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.config.max_handshake_bytes);
        let mut timeout = self.config.first_byte_timeout();
        while bytes.len() < self.config.max_handshake_bytes {
            match self.transport.read_byte_timeout(timeout) {
                Ok(byte) => bytes.push(byte),
                Err(TransportError::Timeout) => break,
                Err(error) => return Err(error.into()),
            }
            timeout = self.config.next_byte_timeout();
        }
        Ok(bytes)
    }

    fn echo_probe(&self, settled: bool) -> DetectResult<Option<DetectionResult>> {
        let transport = self.transport;
        transport.set_modem_control(ModemControl::POWER_ON)?;
        if !settled {
            transport.delay(self.config.power_on_delay());
        }

        for &baud in &self.config.baud_candidates {
            transport.set_line_parameters(LineParameters::eight_o_one(baud))?;
            transport.write_bytes(&[PROMPT_MODE])?;
            transport.write_bytes(&[STATUS_QUERY])?;
            transport.flush_input()?;

            match transport.read_byte_timeout(self.config.echo_timeout()) {
                Ok(STATUS_OK) => {
                    let button_count = self.query_button_count()?;
                    return Ok(Some(DetectionResult {
                        variant: ProtocolKind::Mm,
                        button_count,
                        baud_rate: baud,
                    }));
                }
                Ok(reply) => debug!(baud, reply, "Unexpected status reply"),
                Err(TransportError::Timeout) => debug!(baud, "No status reply"),
                Err(error) => return Err(error.into()),
            }
        }
        Ok(None)
    }

    fn query_button_count(&self) -> DetectResult<u8> {
        let fallback = self.config.default_buttons;
        if !self.config.query_button_count {
            return Ok(fallback);
        }

        self.transport.write_bytes(&[BUTTON_QUERY])?;
        match self.transport.read_byte_timeout(self.config.echo_timeout()) {
            Ok(reply) => {
                let count = reply & 0x0F;
                if count == 2 || count == 3 {
                    Ok(count)
                } else {
                    debug!(reply, fallback, "Untrusted button count");
                    Ok(fallback)
                }
            }
            Err(TransportError::Timeout) => Ok(fallback),
            Err(error) => Err(error.into()),
        }
    }

    fn restore_defaults(&self, found: DetectionResult) -> DetectResult<DetectionResult> {
        let transport = self.transport;
        let restored = match found.variant {
            ProtocolKind::Mm => {
                let baud = self.config.default_baud;
                transport.write_bytes(&baud_command(baud)?)?;
                transport.set_line_parameters(LineParameters::eight_o_one(baud))?;
                transport.write_bytes(&[self.config.default_report_rate.command()])?;
                DetectionResult {
                    baud_rate: baud,
                    ..found
                }
            }
            ProtocolKind::Mp | ProtocolKind::Bp | ProtocolKind::Z => {
                transport.set_line_parameters(found.line_parameters())?;
                found
            }
        };
        transport.flush_input()?;

        if self.config.verbosity.lifecycle() {
            info!(
                variant = %restored.variant,
                buttons = restored.button_count,
                baud = restored.baud_rate,
                "Serial mouse detected"
            );
        }
        Ok(restored)
    }
}
