//! MM-series packets
//!
//! ```text
//! byte 0: 1 0 0 Xs Ys L M R
//! byte 1: 0 X6 X5 X4 X3 X2 X1 X0
//! byte 2: 0 Y6 Y5 Y4 Y3 Y2 Y1 Y0
//! ```
//!
//! `Xs`/`Ys` are bit 7 of the 8-bit two's-complement motion values.

use super::invalid_state;
use crate::{Buttons, DecodeState, HandlerState, InputEvent, MM_SYNC_BIT, ProtocolKind};

const SIGN_X: u8 = 0x10;
const SIGN_Y: u8 = 0x08;
const BUTTON_LEFT: u8 = 0x04;
const BUTTON_MIDDLE: u8 = 0x02;
const BUTTON_RIGHT: u8 = 0x01;

pub(super) fn feed(handler: &mut HandlerState, byte: u8) -> Option<InputEvent> {
    let sync = byte & MM_SYNC_BIT != 0;
    if sync && handler.state != DecodeState::State0 {
        handler.resync();
    }

    match handler.state {
        DecodeState::State0 => {
            if sync {
                handler.store(byte);
            } else {
                handler.resync();
            }
            None
        }
        DecodeState::State1 => {
            handler.store(byte);
            None
        }
        DecodeState::State2 => {
            handler.store_last(byte);
            Some(build_event(handler))
        }
        state @ (DecodeState::State3 | DecodeState::State4) => {
            invalid_state(ProtocolKind::Mm, state)
        }
    }
}

fn build_event(handler: &mut HandlerState) -> InputEvent {
    let [b0, b1, b2, ..] = handler.raw;

    let mut buttons = Buttons::empty();
    buttons.set(Buttons::LEFT, b0 & BUTTON_LEFT != 0);
    buttons.set(Buttons::MIDDLE, b0 & BUTTON_MIDDLE != 0);
    buttons.set(Buttons::RIGHT, b0 & BUTTON_RIGHT != 0);

    let dx = extend(b1, b0 & SIGN_X != 0);
    let dy = extend(b2, b0 & SIGN_Y != 0);

    let event = InputEvent::new(buttons, handler.previous_buttons, dx, dy, 0);
    handler.previous_buttons = buttons;
    event
}

fn extend(low: u8, negative: bool) -> i32 {
    let high = if negative { 0x80 } else { 0x00 };
    i32::from((low & 0x7F | high) as i8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventFlags;

    fn feed_all(handler: &mut HandlerState, bytes: &[u8]) -> Vec<InputEvent> {
        bytes.iter().filter_map(|&b| feed(handler, b)).collect()
    }

    #[test]
    fn test_negative_motion() {
        let mut handler = HandlerState::new();
        // Xs and Ys set, low bits 0x7E => -2 on both axes
        let events = feed_all(&mut handler, &[0x98, 0x7E, 0x7E]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].dx, -2);
        assert_eq!(events[0].dy, -2);
        assert!(events[0].buttons.is_empty());
    }

    #[test]
    fn test_all_buttons_and_edges() {
        let mut handler = HandlerState::new();
        let events = feed_all(&mut handler, &[0x87, 0x00, 0x00, 0x80, 0x00, 0x00]);
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].buttons, Buttons::all());
        assert_eq!(events[0].button_edges, Buttons::all());
        assert!(events[0].flags.contains(EventFlags::BUTTON_CHANGE));

        assert!(events[1].buttons.is_empty());
        assert_eq!(events[1].released(), Buttons::all());
    }

    #[test]
    fn test_sync_mid_packet_restarts() {
        let mut handler = HandlerState::new();
        let events = feed_all(&mut handler, &[0x80, 0x01, 0x84, 0x02, 0x03]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].dx, 2);
        assert_eq!(handler.error_count, 1);
    }

    #[test]
    fn test_noise_discarded() {
        let mut handler = HandlerState::new();
        let events = feed_all(&mut handler, &[0x10, 0x20, 0x30]);
        assert!(events.is_empty());
        assert_eq!(handler.error_count, 3);
        assert_eq!(handler.state, DecodeState::State0);
    }
}
