//! Packet decoders for legacy serial pointing devices
//!
//! This crate turns a raw byte stream from a serial line into discrete
//! [`InputEvent`]s. It performs no I/O and never allocates: every decoder is a
//! small state machine fed one byte at a time.
//!
//! ## Supported protocols
//! - **MM**: MM-series 3-byte packets (sync bit `0x80`, three buttons)
//! - **MP**: Microsoft 3-byte packets with the optional middle-button byte
//! - **BP**: Microsoft BallPoint 4-byte packets with explicit sign bits
//! - **Z**: Microsoft wheel packets, 4 or 5 bytes long
//!
//! ## Example
//! ```rust
//! use sermouse_protocol::{Buttons, Decoder, LineState, ProtocolKind};
//!
//! let mut decoder = Decoder::new(ProtocolKind::Mm);
//! let mut events = [0x84u8, 0x05, 0x03]
//!     .into_iter()
//!     .filter_map(|byte| decoder.feed(byte, LineState::empty()));
//!
//! let event = events.next().ok_or("no event")?;
//! assert_eq!((event.dx, event.dy), (5, 3));
//! assert!(event.buttons.contains(Buttons::LEFT));
//! # Ok::<(), &str>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod decode;
pub mod encode;
pub mod state;
pub mod types;

pub use decode::Decoder;
pub use encode::{PacketBytes, encode_packet};
pub use state::{DecodeState, HandlerState};
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("Motion out of range for {protocol}: {axis}={value}")]
    MotionOutOfRange {
        protocol: ProtocolKind,
        axis: &'static str,
        value: i32,
    },

    #[error("Wheel value {0} out of range")]
    WheelOutOfRange(i16),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Longest packet any protocol produces (Z with the extra byte).
pub const MAX_PACKET_LEN: usize = 5;

/// Sync bit of the MM-series first byte.
pub const MM_SYNC_BIT: u8 = 0x80;

/// Sync bit of the Microsoft-family first byte.
pub const MS_SYNC_BIT: u8 = 0x40;
