//! Line parameters, modem control and status bits

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use sermouse_protocol::{LineState, ProtocolKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataBits {
    Seven,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

/// Baud rate and character format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineParameters {
    pub baud: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl LineParameters {
    pub const fn new(baud: u32, data_bits: DataBits, parity: Parity, stop_bits: StopBits) -> Self {
        Self {
            baud,
            data_bits,
            parity,
            stop_bits,
        }
    }

    /// 7 data bits, no parity, one stop bit: the Microsoft family format.
    pub const fn seven_n_one(baud: u32) -> Self {
        Self::new(baud, DataBits::Seven, Parity::None, StopBits::One)
    }

    /// 8 data bits, odd parity, one stop bit: the MM-series format.
    pub const fn eight_o_one(baud: u32) -> Self {
        Self::new(baud, DataBits::Eight, Parity::Odd, StopBits::One)
    }

    /// Format a `kind` device speaks at `baud`.
    pub const fn for_protocol(kind: ProtocolKind, baud: u32) -> Self {
        match kind {
            ProtocolKind::Mm => Self::eight_o_one(baud),
            ProtocolKind::Mp | ProtocolKind::Bp | ProtocolKind::Z => Self::seven_n_one(baud),
        }
    }

    /// Same format at another baud rate.
    #[must_use]
    pub const fn with_baud(self, baud: u32) -> Self {
        Self { baud, ..self }
    }

    /// Time one character takes on the wire, including start bit.
    pub fn char_time(&self) -> std::time::Duration {
        let data = match self.data_bits {
            DataBits::Seven => 7u64,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 0u64,
            Parity::Odd | Parity::Even => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1u64,
            StopBits::Two => 2,
        };
        let bits = 1 + data + parity + stop;
        let baud = u64::from(self.baud.max(1));
        std::time::Duration::from_micros(bits * 1_000_000 / baud)
    }
}

impl fmt::Display for LineParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = match self.data_bits {
            DataBits::Seven => '7',
            DataBits::Eight => '8',
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => '1',
            StopBits::Two => '2',
        };
        write!(f, "{} {data}{parity}{stop}", self.baud)
    }
}

/// Output modem-control lines. Serial mice draw their power from DTR and RTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ModemControl {
    pub dtr: bool,
    pub rts: bool,
}

impl ModemControl {
    pub const POWER_ON: Self = Self {
        dtr: true,
        rts: true,
    };

    pub const POWER_OFF: Self = Self {
        dtr: false,
        rts: false,
    };

    pub fn powers_device(self) -> bool {
        self.dtr && self.rts
    }
}

bitflags! {
    /// Input modem-status lines.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LineStatus: u8 {
        const CTS = 0x10;
        const DSR = 0x20;
        const RING = 0x40;
        const DCD = 0x80;
    }
}

/// One received byte with the line errors seen while receiving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RxByte {
    pub byte: u8,
    pub line: LineState,
}

impl RxByte {
    pub fn clean(byte: u8) -> Self {
        Self {
            byte,
            line: LineState::empty(),
        }
    }

    pub fn with_line(byte: u8, line: LineState) -> Self {
        Self { byte, line }
    }
}
