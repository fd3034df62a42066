//! Packet fixtures.
//!
//! Hand-checked byte sequences for each protocol plus [`PacketStream`] for
//! building longer streams through the encoders.

use sermouse_protocol::{Buttons, ProtocolKind, encode_packet};

use crate::must::must_with;

/// Canned packets with known decodings.
pub mod packets {
    /// Left button, dx 5, dy 3.
    pub const MM_LEFT_5_3: [u8; 3] = [0x84, 0x05, 0x03];

    /// No buttons, dx -2, dy -2.
    pub const MM_NEGATIVE_2: [u8; 3] = [0x98, 0x7E, 0x7E];

    /// Right button, dx -1, dy 5.
    pub const MP_RIGHT_NEG1_5: [u8; 3] = [0x53, 0x3F, 0x05];

    /// Middle-button byte: pressed.
    pub const MP_MIDDLE_DOWN: u8 = 0x20;

    /// Middle-button byte: released.
    pub const MP_MIDDLE_UP: u8 = 0x00;

    /// Left button, dx -2, dy -3.
    pub const BP_LEFT_NEG2_NEG3: [u8; 4] = [0x60, 0x02, 0x03, 0x03];

    /// Wheel -1, no buttons.
    pub const Z_WHEEL_NEG1: [u8; 4] = [0x40, 0x00, 0x00, 0x0F];

    /// Middle button, wheel 0.
    pub const Z_MIDDLE_ONLY: [u8; 4] = [0x40, 0x00, 0x00, 0x10];

    /// Wheel 16 through the extra byte.
    pub const Z_WHEEL_16: [u8; 5] = [0x40, 0x00, 0x00, 0x20, 0x01];
}

/// Builds a byte stream one packet at a time.
#[derive(Debug, Clone)]
pub struct PacketStream {
    kind: ProtocolKind,
    bytes: Vec<u8>,
    packets: usize,
}

impl PacketStream {
    pub fn new(kind: ProtocolKind) -> Self {
        Self {
            kind,
            bytes: Vec::new(),
            packets: 0,
        }
    }

    /// Appends one encoded packet.
    ///
    /// # Panics
    ///
    /// Panics if the values do not fit the protocol.
    #[track_caller]
    pub fn sample(mut self, buttons: Buttons, dx: i32, dy: i32, wheel: i16) -> Self {
        let packet = must_with(
            encode_packet(self.kind, buttons, dx, dy, wheel),
            "encoding fixture packet",
        );
        self.bytes.extend_from_slice(packet.as_slice());
        self.packets += 1;
        self
    }

    /// Appends `count` packets of pure motion.
    #[track_caller]
    pub fn motion(mut self, count: usize, dx: i32, dy: i32) -> Self {
        for _ in 0..count {
            self = self.sample(Buttons::empty(), dx, dy, 0);
        }
        self
    }

    /// Appends bytes that are not a packet.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn kind(&self) -> ProtocolKind {
        self.kind
    }

    /// Packets appended through [`PacketStream::sample`] and
    /// [`PacketStream::motion`].
    pub fn packet_count(&self) -> usize {
        self.packets
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
