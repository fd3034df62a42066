//! Packet encoders
//!
//! Used by simulated devices to stream well-formed packets. MP packets always
//! carry the trailing middle-button byte so a release is visible to the
//! decoder.

use crate::{Buttons, MAX_PACKET_LEN, MM_SYNC_BIT, MS_SYNC_BIT, ProtocolError, ProtocolKind, ProtocolResult};

/// A fixed-capacity encoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketBytes {
    bytes: [u8; MAX_PACKET_LEN],
    len: usize,
}

impl PacketBytes {
    fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_PACKET_LEN];
        let len = data.len().min(MAX_PACKET_LEN);
        for (slot, &byte) in bytes.iter_mut().zip(data) {
            *slot = byte;
        }
        Self { bytes, len }
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn check_range(kind: ProtocolKind, axis: &'static str, value: i32, min: i32, max: i32) -> ProtocolResult<()> {
    if value < min || value > max {
        return Err(ProtocolError::MotionOutOfRange {
            protocol: kind,
            axis,
            value,
        });
    }
    Ok(())
}

/// Encodes one packet for `kind`.
///
/// # Errors
///
/// Returns [`ProtocolError::MotionOutOfRange`] when a motion value does not
/// fit the packet, or [`ProtocolError::WheelOutOfRange`] for a wheel value
/// outside `-128..=127`.
pub fn encode_packet(
    kind: ProtocolKind,
    buttons: Buttons,
    dx: i32,
    dy: i32,
    wheel: i16,
) -> ProtocolResult<PacketBytes> {
    match kind {
        ProtocolKind::Mm => encode_mm(buttons, dx, dy),
        ProtocolKind::Mp => {
            let (b0, b1, b2) = ms_core(kind, buttons, dx, dy)?;
            let middle = if buttons.contains(Buttons::MIDDLE) { 0x20 } else { 0x00 };
            Ok(PacketBytes::from_slice(&[b0, b1, b2, middle]))
        }
        ProtocolKind::Bp => encode_bp(buttons, dx, dy),
        ProtocolKind::Z => {
            let (b0, b1, b2) = ms_core(kind, buttons, dx, dy)?;
            let middle = if buttons.contains(Buttons::MIDDLE) { 0x10 } else { 0x00 };
            if (-8..=7).contains(&wheel) {
                let nibble = (wheel as u8) & 0x0F;
                return Ok(PacketBytes::from_slice(&[b0, b1, b2, middle | nibble]));
            }
            let Ok(wheel) = i8::try_from(wheel) else {
                return Err(ProtocolError::WheelOutOfRange(wheel));
            };
            let raw = wheel as u8;
            Ok(PacketBytes::from_slice(&[
                b0,
                b1,
                b2,
                0x20 | middle | (raw & 0x0F),
                raw >> 4,
            ]))
        }
    }
}

fn encode_mm(buttons: Buttons, dx: i32, dy: i32) -> ProtocolResult<PacketBytes> {
    check_range(ProtocolKind::Mm, "dx", dx, -128, 127)?;
    check_range(ProtocolKind::Mm, "dy", dy, -128, 127)?;
    let x = dx as u8;
    let y = dy as u8;

    let mut b0 = MM_SYNC_BIT;
    if x & 0x80 != 0 {
        b0 |= 0x10;
    }
    if y & 0x80 != 0 {
        b0 |= 0x08;
    }
    if buttons.contains(Buttons::LEFT) {
        b0 |= 0x04;
    }
    if buttons.contains(Buttons::MIDDLE) {
        b0 |= 0x02;
    }
    if buttons.contains(Buttons::RIGHT) {
        b0 |= 0x01;
    }
    Ok(PacketBytes::from_slice(&[b0, x & 0x7F, y & 0x7F]))
}

fn ms_header(buttons: Buttons, x: u8, y: u8) -> u8 {
    let mut b0 = MS_SYNC_BIT | ((y & 0xC0) >> 4) | ((x & 0xC0) >> 6);
    if buttons.contains(Buttons::LEFT) {
        b0 |= 0x20;
    }
    if buttons.contains(Buttons::RIGHT) {
        b0 |= 0x10;
    }
    b0
}

fn ms_core(kind: ProtocolKind, buttons: Buttons, dx: i32, dy: i32) -> ProtocolResult<(u8, u8, u8)> {
    check_range(kind, "dx", dx, -128, 127)?;
    check_range(kind, "dy", dy, -128, 127)?;
    let x = dx as u8;
    let y = dy as u8;
    Ok((ms_header(buttons, x, y), x & 0x3F, y & 0x3F))
}

fn encode_bp(buttons: Buttons, dx: i32, dy: i32) -> ProtocolResult<PacketBytes> {
    check_range(ProtocolKind::Bp, "dx", dx, -255, 255)?;
    check_range(ProtocolKind::Bp, "dy", dy, -255, 255)?;
    let x = dx.unsigned_abs() as u8;
    let y = dy.unsigned_abs() as u8;

    let mut signs = 0u8;
    if dx < 0 {
        signs |= 0x01;
    }
    if dy < 0 {
        signs |= 0x02;
    }
    Ok(PacketBytes::from_slice(&[
        ms_header(buttons, x, y),
        x & 0x3F,
        y & 0x3F,
        signs,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_matches_reference_packet() {
        let packet = encode_packet(ProtocolKind::Mm, Buttons::LEFT, 5, 3, 0);
        assert_eq!(packet.map(|p| p.as_slice().to_vec()), Ok(vec![0x84, 0x05, 0x03]));
    }

    #[test]
    fn test_bp_matches_reference_packet() {
        let packet = encode_packet(ProtocolKind::Bp, Buttons::LEFT, -2, -3, 0);
        assert_eq!(
            packet.map(|p| p.as_slice().to_vec()),
            Ok(vec![0x60, 0x02, 0x03, 0x03])
        );
    }

    #[test]
    fn test_z_packet_length_follows_wheel() {
        let short = encode_packet(ProtocolKind::Z, Buttons::empty(), 0, 0, -3);
        assert_eq!(short.map(|p| p.len()), Ok(4));

        let long = encode_packet(ProtocolKind::Z, Buttons::empty(), 0, 0, 40);
        assert_eq!(long.map(|p| p.len()), Ok(5));

        let bad = encode_packet(ProtocolKind::Z, Buttons::empty(), 0, 0, 200);
        assert_eq!(bad, Err(ProtocolError::WheelOutOfRange(200)));
    }

    #[test]
    fn test_motion_range_checked() {
        let err = encode_packet(ProtocolKind::Mm, Buttons::empty(), 128, 0, 0);
        assert!(matches!(err, Err(ProtocolError::MotionOutOfRange { axis: "dx", .. })));

        assert!(encode_packet(ProtocolKind::Bp, Buttons::empty(), -255, 255, 0).is_ok());
    }
}
