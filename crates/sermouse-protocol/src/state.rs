//! Per-device decoder state

use crate::{Buttons, MAX_PACKET_LEN};

/// Position inside the current packet.
///
/// `State0` waits for a byte carrying the sync bit; each later state names
/// the index of the byte expected next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecodeState {
    #[default]
    State0,
    State1,
    State2,
    State3,
    State4,
}

impl DecodeState {
    /// Index of the packet byte this state expects.
    pub fn index(self) -> usize {
        match self {
            DecodeState::State0 => 0,
            DecodeState::State1 => 1,
            DecodeState::State2 => 2,
            DecodeState::State3 => 3,
            DecodeState::State4 => 4,
        }
    }

    pub fn next(self) -> Self {
        match self {
            DecodeState::State0 => DecodeState::State1,
            DecodeState::State1 => DecodeState::State2,
            DecodeState::State2 => DecodeState::State3,
            DecodeState::State3 | DecodeState::State4 => DecodeState::State4,
        }
    }
}

/// Mutable state carried between `feed` calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandlerState {
    pub state: DecodeState,
    pub error_count: u32,
    pub previous_buttons: Buttons,
    pub raw: [u8; MAX_PACKET_LEN],
}

impl HandlerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to a freshly attached device.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Drops the partial packet and counts one synchronization error.
    pub fn resync(&mut self) {
        self.state = DecodeState::State0;
        self.error_count = self.error_count.wrapping_add(1);
    }

    /// Stores `byte` at the current position and advances.
    pub(crate) fn store(&mut self, byte: u8) {
        if let Some(slot) = self.raw.get_mut(self.state.index()) {
            *slot = byte;
        }
        self.state = self.state.next();
    }

    /// Stores the final byte of a packet and returns to `State0`.
    pub(crate) fn store_last(&mut self, byte: u8) {
        if let Some(slot) = self.raw.get_mut(self.state.index()) {
            *slot = byte;
        }
        self.state = DecodeState::State0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_progression() {
        let mut state = DecodeState::State0;
        for expected in 1..=4 {
            state = state.next();
            assert_eq!(state.index(), expected);
        }
        assert_eq!(state.next(), DecodeState::State4);
    }

    #[test]
    fn test_resync_counts_error() {
        let mut handler = HandlerState::new();
        handler.store(0x40);
        handler.store(0x01);
        assert_eq!(handler.state, DecodeState::State2);

        handler.resync();
        assert_eq!(handler.state, DecodeState::State0);
        assert_eq!(handler.error_count, 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut handler = HandlerState::new();
        handler.store(0x80);
        handler.error_count = 7;
        handler.previous_buttons = Buttons::LEFT;

        handler.reset();
        assert_eq!(handler, HandlerState::default());
    }
}
