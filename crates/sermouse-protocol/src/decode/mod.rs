//! Byte-at-a-time packet decoding
//!
//! [`Decoder`] owns a [`HandlerState`] and a [`ProtocolKind`] tag; `feed`
//! dispatches on the tag to the matching state machine. The framing rules
//! are shared by every variant:
//!
//! - a byte carrying the sync bit while a packet is in progress counts one
//!   error, drops the partial packet and starts a new one;
//! - a byte without the sync bit in `State0` is noise: it counts one error
//!   and is discarded;
//! - a byte received with a line error counts one error and resets.

mod microsoft;
mod mm;

use crate::{DecodeState, HandlerState, InputEvent, LineState, ProtocolKind};

/// Stateful decoder for one attached device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    kind: ProtocolKind,
    handler: HandlerState,
}

impl Decoder {
    pub fn new(kind: ProtocolKind) -> Self {
        Self {
            kind,
            handler: HandlerState::new(),
        }
    }

    pub fn kind(&self) -> ProtocolKind {
        self.kind
    }

    pub fn handler(&self) -> &HandlerState {
        &self.handler
    }

    pub fn state(&self) -> DecodeState {
        self.handler.state
    }

    pub fn error_count(&self) -> u32 {
        self.handler.error_count
    }

    /// Restores `State0` and clears counters, as on detach/reattach.
    pub fn reset(&mut self) {
        self.handler.reset();
    }

    /// Switches protocol and starts from a clean state.
    pub fn reinitialize(&mut self, kind: ProtocolKind) {
        self.kind = kind;
        self.handler.reset();
    }

    /// Feeds one received byte.
    ///
    /// Returns an event exactly when `byte` completes a packet.
    ///
    /// # Panics
    ///
    /// Panics if the handler state names a byte slot the active protocol
    /// does not have. `HandlerState` is only advanced by this decoder, so
    /// that can only follow from a defect in the state machine itself.
    pub fn feed(&mut self, byte: u8, line: LineState) -> Option<InputEvent> {
        if line.is_corrupt() {
            self.handler.resync();
            return None;
        }

        match self.kind {
            ProtocolKind::Mm => mm::feed(&mut self.handler, byte),
            ProtocolKind::Mp => microsoft::feed_mp(&mut self.handler, byte),
            ProtocolKind::Bp => microsoft::feed_bp(&mut self.handler, byte),
            ProtocolKind::Z => microsoft::feed_z(&mut self.handler, byte),
        }
    }

    /// Feeds a run of clean bytes, calling `on_event` for every completed packet.
    pub fn feed_all(&mut self, bytes: &[u8], mut on_event: impl FnMut(InputEvent)) {
        for &byte in bytes {
            if let Some(event) = self.feed(byte, LineState::empty()) {
                on_event(event);
            }
        }
    }
}

#[track_caller]
fn invalid_state(kind: ProtocolKind, state: DecodeState) -> ! {
    panic!("{kind} decoder reached {state:?}, which has no byte slot in its packet")
}
