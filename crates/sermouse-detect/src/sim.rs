//! Simulated devices for [`sermouse_transport::mock::MockSerialPort`]
//!
//! A responder only answers legibly when the host line matches the format
//! and rate the device is running at. Anything else comes back garbled, as
//! it would on a real wire.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sermouse_protocol::ProtocolKind;
use sermouse_transport::mock::DeviceResponder;
use sermouse_transport::{DataBits, LineParameters, Parity};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::commands::{
    BAUD_PREFIX, BUTTON_QUERY, PROMPT_MODE, ReportRate, STATUS_OK, STATUS_QUERY, baud_for_code,
};
use crate::engine::HANDSHAKE_BAUD;

/// What a prompt-mode device answers when the line rate is wrong.
const GARBLED: u8 = 0xF0;

/// A device that sends an identification string on power-up.
#[derive(Debug, Clone)]
pub struct HandshakeMouse {
    preamble: Vec<u8>,
    id: Vec<u8>,
}

impl HandshakeMouse {
    pub fn new(id: impl Into<Vec<u8>>) -> Self {
        Self {
            preamble: Vec::new(),
            id: id.into(),
        }
    }

    pub fn microsoft() -> Self {
        Self::new(b"M".to_vec())
    }

    pub fn three_button() -> Self {
        Self::new(b"M3".to_vec())
    }

    pub fn wheel() -> Self {
        Self::new(b"MZ".to_vec())
    }

    pub fn ballpoint() -> Self {
        Self::new(b"B".to_vec())
    }

    /// Bytes sent ahead of the identification, such as power-on noise.
    #[must_use]
    pub fn with_preamble(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.preamble = bytes.into();
        self
    }
}

impl DeviceResponder for HandshakeMouse {
    fn on_power_up(&mut self, line: &LineParameters) -> Vec<u8> {
        let legible = *line == LineParameters::seven_n_one(HANDSHAKE_BAUD);
        self.preamble
            .iter()
            .chain(&self.id)
            .map(|&b| if legible { b } else { b | 0x80 })
            .collect()
    }

    fn on_write(&mut self, _line: &LineParameters, _data: &[u8]) -> Vec<u8> {
        Vec::new()
    }
}

/// Observable state of a [`PromptMouse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptMouseState {
    pub baud: u32,
    pub prompt_mode: bool,
    pub report_rate: ReportRate,
}

/// A silent-on-power-up device that answers the prompt-mode command set.
///
/// It comes up at `power_on_baud` and only understands commands sent at its
/// current rate in 8O1.
#[derive(Debug, Clone)]
pub struct PromptMouse {
    power_on_baud: u32,
    buttons: u8,
    awaiting_baud_code: bool,
    state: Arc<Mutex<PromptMouseState>>,
}

impl PromptMouse {
    pub fn new(power_on_baud: u32, buttons: u8) -> Self {
        Self {
            power_on_baud,
            buttons,
            awaiting_baud_code: false,
            state: Arc::new(Mutex::new(PromptMouseState {
                baud: power_on_baud,
                prompt_mode: false,
                report_rate: ReportRate::Continuous,
            })),
        }
    }

    /// Shared view of the device state, readable after the responder has
    /// been handed to a port.
    pub fn state_handle(&self) -> Arc<Mutex<PromptMouseState>> {
        Arc::clone(&self.state)
    }

    fn legible(line: &LineParameters, baud: u32) -> bool {
        line.baud == baud && line.data_bits == DataBits::Eight && line.parity == Parity::Odd
    }
}

impl DeviceResponder for PromptMouse {
    fn on_power_up(&mut self, _line: &LineParameters) -> Vec<u8> {
        self.awaiting_baud_code = false;
        *self.state.lock() = PromptMouseState {
            baud: self.power_on_baud,
            prompt_mode: false,
            report_rate: ReportRate::Continuous,
        };
        Vec::new()
    }

    fn on_write(&mut self, line: &LineParameters, data: &[u8]) -> Vec<u8> {
        let mut state = self.state.lock();
        if !Self::legible(line, state.baud) {
            return vec![GARBLED];
        }

        let mut reply = Vec::new();
        for &byte in data {
            if self.awaiting_baud_code {
                self.awaiting_baud_code = false;
                if let Some(baud) = baud_for_code(byte) {
                    state.baud = baud;
                }
                continue;
            }
            match byte {
                BAUD_PREFIX => self.awaiting_baud_code = true,
                PROMPT_MODE => state.prompt_mode = true,
                STATUS_QUERY => reply.push(STATUS_OK),
                BUTTON_QUERY => reply.push(b'0'.wrapping_add(self.buttons)),
                other => {
                    if let Some(rate) = ReportRate::from_command(other) {
                        state.report_rate = rate;
                        state.prompt_mode = false;
                    }
                }
            }
        }
        reply
    }
}

/// Ready-made devices for simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulatedDevice {
    Microsoft,
    ThreeButton,
    Wheel,
    Ballpoint,
    MmSeries,
}

impl SimulatedDevice {
    pub const ALL: [SimulatedDevice; 5] = [
        SimulatedDevice::Microsoft,
        SimulatedDevice::ThreeButton,
        SimulatedDevice::Wheel,
        SimulatedDevice::Ballpoint,
        SimulatedDevice::MmSeries,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SimulatedDevice::Microsoft => "microsoft",
            SimulatedDevice::ThreeButton => "three-button",
            SimulatedDevice::Wheel => "wheel",
            SimulatedDevice::Ballpoint => "ballpoint",
            SimulatedDevice::MmSeries => "mm-series",
        }
    }

    /// Protocol detection should settle on.
    pub fn protocol(self) -> ProtocolKind {
        match self {
            SimulatedDevice::Microsoft | SimulatedDevice::ThreeButton => ProtocolKind::Mp,
            SimulatedDevice::Wheel => ProtocolKind::Z,
            SimulatedDevice::Ballpoint => ProtocolKind::Bp,
            SimulatedDevice::MmSeries => ProtocolKind::Mm,
        }
    }

    pub fn button_count(self) -> u8 {
        match self {
            SimulatedDevice::Microsoft | SimulatedDevice::Ballpoint => 2,
            SimulatedDevice::ThreeButton | SimulatedDevice::Wheel | SimulatedDevice::MmSeries => 3,
        }
    }

    /// The MM-series device sits at 2400 baud so the sweep has to move.
    pub fn responder(self) -> Box<dyn DeviceResponder> {
        match self {
            SimulatedDevice::Microsoft => Box::new(HandshakeMouse::microsoft()),
            SimulatedDevice::ThreeButton => Box::new(HandshakeMouse::three_button()),
            SimulatedDevice::Wheel => Box::new(HandshakeMouse::wheel()),
            SimulatedDevice::Ballpoint => Box::new(HandshakeMouse::ballpoint()),
            SimulatedDevice::MmSeries => Box::new(PromptMouse::new(2400, 3)),
        }
    }
}

impl fmt::Display for SimulatedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimulatedDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SimulatedDevice::ALL
            .into_iter()
            .find(|device| device.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown device '{s}'"))
    }
}
