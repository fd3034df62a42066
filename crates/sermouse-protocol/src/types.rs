//! Type definitions shared by every decoder variant

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// Packet family selected by detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    /// MM-series, 3-byte packets, three buttons.
    Mm,
    /// Microsoft 3-byte packets plus optional middle-button byte.
    Mp,
    /// Microsoft BallPoint, 4-byte packets.
    Bp,
    /// Microsoft wheel mouse, 4- or 5-byte packets.
    Z,
}

impl ProtocolKind {
    pub const ALL: [ProtocolKind; 4] = [
        ProtocolKind::Mm,
        ProtocolKind::Mp,
        ProtocolKind::Bp,
        ProtocolKind::Z,
    ];

    /// Bit that frames packet start in byte 0.
    pub fn sync_bit(self) -> u8 {
        match self {
            ProtocolKind::Mm => crate::MM_SYNC_BIT,
            ProtocolKind::Mp | ProtocolKind::Bp | ProtocolKind::Z => crate::MS_SYNC_BIT,
        }
    }

    /// Shortest complete packet.
    pub fn min_packet_len(self) -> usize {
        match self {
            ProtocolKind::Mm | ProtocolKind::Mp => 3,
            ProtocolKind::Bp | ProtocolKind::Z => 4,
        }
    }

    /// Longest complete packet, including optional trailing bytes.
    pub fn max_packet_len(self) -> usize {
        match self {
            ProtocolKind::Mm => 3,
            ProtocolKind::Mp | ProtocolKind::Bp => 4,
            ProtocolKind::Z => 5,
        }
    }

    pub fn has_wheel(self) -> bool {
        matches!(self, ProtocolKind::Z)
    }

    pub fn name(self) -> &'static str {
        match self {
            ProtocolKind::Mm => "mm",
            ProtocolKind::Mp => "mp",
            ProtocolKind::Bp => "bp",
            ProtocolKind::Z => "z",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProtocolKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" => Ok(ProtocolKind::Mm),
            "mp" => Ok(ProtocolKind::Mp),
            "bp" => Ok(ProtocolKind::Bp),
            "z" => Ok(ProtocolKind::Z),
            other => Err(ProtocolError::UnknownProtocol(other.to_string())),
        }
    }
}

bitflags! {
    /// Button state bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const LEFT = 0x01;
        const RIGHT = 0x02;
        const MIDDLE = 0x04;
    }
}

bitflags! {
    /// Qualifiers attached to a decoded event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u8 {
        /// `wheel` carries a non-zero value.
        const WHEEL = 0x01;
        /// At least one button changed state with this packet.
        const BUTTON_CHANGE = 0x02;
    }
}

bitflags! {
    /// Receive-side line errors reported alongside a byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LineState: u8 {
        const PARITY_ERROR = 0x01;
        const FRAMING_ERROR = 0x02;
        const OVERRUN = 0x04;
    }
}

impl LineState {
    /// True when the accompanying byte cannot be trusted.
    pub fn is_corrupt(self) -> bool {
        !self.is_empty()
    }
}

/// One decoded packet.
///
/// `dy` follows screen convention: positive values move south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputEvent {
    pub buttons: Buttons,
    pub dx: i32,
    pub dy: i32,
    pub wheel: i16,
    pub button_edges: Buttons,
    pub flags: EventFlags,
}

impl InputEvent {
    /// Builds an event and derives edges and flags from the previous button state.
    pub fn new(buttons: Buttons, previous: Buttons, dx: i32, dy: i32, wheel: i16) -> Self {
        let button_edges = buttons ^ previous;
        let mut flags = EventFlags::empty();
        if wheel != 0 {
            flags |= EventFlags::WHEEL;
        }
        if !button_edges.is_empty() {
            flags |= EventFlags::BUTTON_CHANGE;
        }
        Self {
            buttons,
            dx,
            dy,
            wheel,
            button_edges,
            flags,
        }
    }

    pub fn has_motion(&self) -> bool {
        self.dx != 0 || self.dy != 0
    }

    pub fn pressed(&self) -> Buttons {
        self.button_edges & self.buttons
    }

    pub fn released(&self) -> Buttons {
        self.button_edges - self.buttons
    }
}
