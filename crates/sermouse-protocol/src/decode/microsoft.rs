//! Microsoft-family packets (MP, BP, Z)
//!
//! All three share the 3-byte core:
//!
//! ```text
//! byte 0: x 1 L R Y7 Y6 X7 X6
//! byte 1: x 0 X5 X4 X3 X2 X1 X0
//! byte 2: x 0 Y5 Y4 Y3 Y2 Y1 Y0
//! ```
//!
//! and differ in what follows:
//!
//! - **MP**: an optional byte `x 0 M 0 0 0 0 0` reporting the middle button;
//! - **BP**: `x 0 0 0 0 0 Sy Sx`, motion is an unsigned magnitude and the
//!   sign bits make it negative;
//! - **Z**: `x 0 E M W3 W2 W1 W0`, followed by `x 0 0 0 W7 W6 W5 W4` when `E`
//!   is set.

use super::invalid_state;
use crate::{Buttons, DecodeState, HandlerState, InputEvent, MS_SYNC_BIT, ProtocolKind};

const BUTTON_LEFT: u8 = 0x20;
const BUTTON_RIGHT: u8 = 0x10;

const MP_MIDDLE: u8 = 0x20;

// Bit 7 is not part of any Microsoft-family byte.
const DATA_MASK: u8 = 0x7F;

const BP_SIGN_X: u8 = 0x01;
const BP_SIGN_Y: u8 = 0x02;

const Z_EXTRA: u8 = 0x20;
const Z_MIDDLE: u8 = 0x10;
const Z_NIBBLE: u8 = 0x0F;

fn is_sync(byte: u8) -> bool {
    byte & MS_SYNC_BIT != 0
}

/// Common framing for the first three states.
///
/// Returns `true` when the caller should go on to its variant-specific
/// handling of the current state.
fn frame(handler: &mut HandlerState, byte: u8) -> bool {
    let sync = is_sync(byte);
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
            false
        }
        DecodeState::State1 => {
            handler.store(byte);
            false
        }
        _ => true,
    }
}

fn core_buttons(b0: u8) -> Buttons {
    let mut buttons = Buttons::empty();
    buttons.set(Buttons::LEFT, b0 & BUTTON_LEFT != 0);
    buttons.set(Buttons::RIGHT, b0 & BUTTON_RIGHT != 0);
    buttons
}

/// Raw 8-bit motion values assembled from the core bytes.
fn core_motion(b0: u8, b1: u8, b2: u8) -> (u8, u8) {
    let x = ((b0 & 0x03) << 6) | (b1 & 0x3F);
    let y = ((b0 & 0x0C) << 4) | (b2 & 0x3F);
    (x, y)
}

fn emit(handler: &mut HandlerState, buttons: Buttons, dx: i32, dy: i32, wheel: i16) -> InputEvent {
    let event = InputEvent::new(buttons, handler.previous_buttons, dx, dy, wheel);
    handler.previous_buttons = buttons;
    event
}

pub(super) fn feed_mp(handler: &mut HandlerState, byte: u8) -> Option<InputEvent> {
    // State3 is the window after a complete core packet in which the
    // middle-button byte may appear. A sync byte there simply starts the
    // next packet.
    if handler.state == DecodeState::State3 {
        handler.state = DecodeState::State0;
        if !is_sync(byte) {
            return middle_byte(handler, byte);
        }
    }

    if !frame(handler, byte) {
        return None;
    }

    match handler.state {
        DecodeState::State2 => {
            handler.store(byte);
            let [b0, b1, b2, ..] = handler.raw;
            let buttons = core_buttons(b0) | (handler.previous_buttons & Buttons::MIDDLE);
            let (x, y) = core_motion(b0, b1, b2);
            Some(emit(
                handler,
                buttons,
                i32::from(x as i8),
                i32::from(y as i8),
                0,
            ))
        }
        state => invalid_state(ProtocolKind::Mp, state),
    }
}

fn middle_byte(handler: &mut HandlerState, byte: u8) -> Option<InputEvent> {
    let byte = byte & DATA_MASK;
    if byte & !MP_MIDDLE != 0 {
        handler.resync();
        return None;
    }

    let mut buttons = handler.previous_buttons;
    buttons.set(Buttons::MIDDLE, byte & MP_MIDDLE != 0);
    if buttons == handler.previous_buttons {
        return None;
    }
    Some(emit(handler, buttons, 0, 0, 0))
}

pub(super) fn feed_bp(handler: &mut HandlerState, byte: u8) -> Option<InputEvent> {
    if !frame(handler, byte) {
        return None;
    }

    match handler.state {
        DecodeState::State2 => {
            handler.store(byte);
            None
        }
        DecodeState::State3 => {
            handler.store_last(byte);
            let [b0, b1, b2, b3, _] = handler.raw;
            let (x, y) = core_motion(b0, b1, b2);
            let dx = signed_magnitude(x, b3 & BP_SIGN_X != 0);
            let dy = signed_magnitude(y, b3 & BP_SIGN_Y != 0);
            Some(emit(handler, core_buttons(b0), dx, dy, 0))
        }
        state => invalid_state(ProtocolKind::Bp, state),
    }
}

fn signed_magnitude(magnitude: u8, negative: bool) -> i32 {
    let value = i32::from(magnitude);
    if negative { -value } else { value }
}

pub(super) fn feed_z(handler: &mut HandlerState, byte: u8) -> Option<InputEvent> {
    if !frame(handler, byte) {
        return None;
    }

    match handler.state {
        DecodeState::State2 => {
            handler.store(byte);
            None
        }
        DecodeState::State3 => {
            if byte & Z_EXTRA != 0 {
                handler.store(byte);
                return None;
            }
            handler.store_last(byte);
            // Sign-extend the low nibble.
            let wheel = (((byte & Z_NIBBLE) << 4) as i8) >> 4;
            Some(z_event(handler, i16::from(wheel)))
        }
        DecodeState::State4 => {
            handler.store_last(byte);
            let low = handler.raw[3] & Z_NIBBLE;
            let wheel = (((byte & Z_NIBBLE) << 4) | low) as i8;
            Some(z_event(handler, i16::from(wheel)))
        }
        state => invalid_state(ProtocolKind::Z, state),
    }
}

fn z_event(handler: &mut HandlerState, wheel: i16) -> InputEvent {
    let [b0, b1, b2, b3, _] = handler.raw;
    let mut buttons = core_buttons(b0);
    buttons.set(Buttons::MIDDLE, b3 & Z_MIDDLE != 0);
    let (x, y) = core_motion(b0, b1, b2);
    emit(handler, buttons, i32::from(x as i8), i32::from(y as i8), wheel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventFlags;

    fn run(
        feed: fn(&mut HandlerState, u8) -> Option<InputEvent>,
        handler: &mut HandlerState,
        bytes: &[u8],
    ) -> Vec<InputEvent> {
        bytes.iter().filter_map(|&b| feed(handler, b)).collect()
    }

    #[test]
    fn test_mp_core_motion() {
        let mut handler = HandlerState::new();
        // X7X6 = 11, low six bits 0x3F => -1; Y positive 5
        let events = run(feed_mp, &mut handler, &[0x53, 0x3F, 0x05]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].dx, -1);
        assert_eq!(events[0].dy, 5);
        assert_eq!(events[0].buttons, Buttons::RIGHT);
        assert_eq!(handler.state, DecodeState::State3);
    }

    #[test]
    fn test_mp_middle_byte_edges() {
        let mut handler = HandlerState::new();
        let events = run(
            feed_mp,
            &mut handler,
            &[0x40, 0x00, 0x00, 0x20, 0x40, 0x01, 0x00, 0x20, 0x40, 0x00, 0x00, 0x00],
        );
        // core, middle down, core (middle held), repeated middle byte (no
        // change, no event), core, middle up
        assert_eq!(events.len(), 5);

        assert_eq!(events[1].buttons, Buttons::MIDDLE);
        assert_eq!(events[1].button_edges, Buttons::MIDDLE);
        assert!(!events[1].has_motion());

        assert_eq!(events[2].buttons, Buttons::MIDDLE);
        assert_eq!(events[2].dx, 1);
        assert!(events[2].button_edges.is_empty());

        assert_eq!(events[3].buttons, Buttons::MIDDLE);
        assert!(events[4].buttons.is_empty());
        assert_eq!(events[4].released(), Buttons::MIDDLE);
        assert_eq!(handler.error_count, 0);
    }

    #[test]
    fn test_mp_bad_extension_is_noise() {
        let mut handler = HandlerState::new();
        let events = run(feed_mp, &mut handler, &[0x40, 0x00, 0x00, 0x21]);
        assert_eq!(events.len(), 1);
        assert_eq!(handler.error_count, 1);
        assert_eq!(handler.state, DecodeState::State0);
    }

    #[test]
    fn test_mp_middle_byte_ignores_bit_seven() {
        let mut handler = HandlerState::new();
        let events = run(feed_mp, &mut handler, &[0x40, 0x00, 0x00, 0xA0, 0x40, 0x00, 0x00, 0x80]);
        assert_eq!(events.len(), 4);
        assert_eq!(events[1].pressed(), Buttons::MIDDLE);
        assert_eq!(events[3].released(), Buttons::MIDDLE);
        assert_eq!(handler.error_count, 0);
    }

    #[test]
    fn test_bp_positive_and_buttons() {
        let mut handler = HandlerState::new();
        let events = run(feed_bp, &mut handler, &[0x70, 0x07, 0x09, 0x00]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].dx, 7);
        assert_eq!(events[0].dy, 9);
        assert_eq!(events[0].buttons, Buttons::LEFT | Buttons::RIGHT);
    }

    #[test]
    fn test_bp_high_bits_extend_magnitude() {
        let mut handler = HandlerState::new();
        // X7X6 = 01 => magnitude 0x40 + 1, negative
        let events = run(feed_bp, &mut handler, &[0x41, 0x01, 0x00, 0x01]);
        assert_eq!(events[0].dx, -65);
        assert_eq!(events[0].dy, 0);
    }

    #[test]
    fn test_z_four_byte_wheel() {
        let mut handler = HandlerState::new();
        let events = run(feed_z, &mut handler, &[0x40, 0x00, 0x00, 0x0F]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].wheel, -1);
        assert!(events[0].flags.contains(EventFlags::WHEEL));

        let events = run(feed_z, &mut handler, &[0x40, 0x00, 0x00, 0x03]);
        assert_eq!(events[0].wheel, 3);

        let events = run(feed_z, &mut handler, &[0x40, 0x00, 0x00, 0x10]);
        assert_eq!(events[0].wheel, 0);
        assert!(!events[0].flags.contains(EventFlags::WHEEL));
        assert_eq!(events[0].buttons, Buttons::MIDDLE);
    }

    #[test]
    fn test_z_five_byte_wheel() {
        let mut handler = HandlerState::new();
        let events = run(feed_z, &mut handler, &[0x40, 0x00, 0x00, 0x20, 0x01]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].wheel, 16);

        let events = run(feed_z, &mut handler, &[0x40, 0x00, 0x00, 0x2C, 0x0F]);
        assert_eq!(events[0].wheel, -4);
        assert_eq!(handler.state, DecodeState::State0);
    }

    #[test]
    fn test_z_sync_in_extra_byte_restarts() {
        let mut handler = HandlerState::new();
        let events = run(feed_z, &mut handler, &[0x40, 0x00, 0x00, 0x20, 0x40, 0x00, 0x00, 0x01]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].wheel, 1);
        assert_eq!(handler.error_count, 1);
    }
}
