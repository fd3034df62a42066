//! Full attach, stream and unplug against a simulated device

use anyhow::Result;
use sermouse_detect::sim::SimulatedDevice;
use sermouse_pipeline::{ChannelSink, MouseConfig, SerialMouse, SinkMessage};
use sermouse_protocol::{Buttons, ProtocolKind, encode_packet};
use sermouse_transport::LineStatus;
use sermouse_transport::mock::MockSerialPort;
use std::sync::Arc;
use tracing::info;

use crate::error::CliError;
use crate::output::{self, SimulationReport};

pub fn execute(device: SimulatedDevice, packets: usize, unplug: bool, config: MouseConfig, json: bool) -> Result<()> {
    let port = Arc::new(
        MockSerialPort::inline()
            .with_responder(device.responder())
            .with_line_status(LineStatus::CTS | LineStatus::DSR),
    );
    let (sink, events) = ChannelSink::unbounded();
    let mut mouse = SerialMouse::new(port.clone(), Arc::new(sink), config).map_err(CliError::from)?;

    let detection = mouse
        .try_attach()
        .map_err(CliError::from)?
        .ok_or_else(|| CliError::NoDeviceDetected(device.to_string()))?;
    info!(device = %device, protocol = %detection.variant, "Simulated device attached");

    port.push_bytes(&motion_script(detection.variant, packets)?);
    if unplug {
        port.disconnect();
    }

    let mut delivered = 0usize;
    let mut removed = false;
    for message in events.try_iter() {
        match message {
            SinkMessage::Event(event) => {
                output::print_event(delivered, &event);
                delivered += 1;
            }
            SinkMessage::Removed => removed = true,
        }
    }

    let counters = mouse.counters();
    mouse.on_remove().map_err(CliError::from)?;

    output::print_simulation_report(
        &SimulationReport {
            device: device.to_string(),
            detection,
            events: delivered,
            removed,
            counters,
        },
        json,
    );
    Ok(())
}

/// A looping figure with a button click every eighth packet and wheel
/// ticks on wheel devices.
fn motion_script(kind: ProtocolKind, packets: usize) -> Result<Vec<u8>, CliError> {
    const DX: [i32; 8] = [4, 3, 0, -3, -4, -3, 0, 3];
    const DY: [i32; 8] = [0, 3, 4, 3, 0, -3, -4, -3];

    let mut bytes = Vec::new();
    for (step, (dx, dy)) in DX.iter().zip(DY.iter()).cycle().take(packets).enumerate() {
        let buttons = if step % 8 == 7 { Buttons::LEFT } else { Buttons::empty() };
        let wheel = if kind.has_wheel() && step % 4 == 0 { 1 } else { 0 };
        let packet = encode_packet(kind, buttons, *dx, *dy, wheel)
            .map_err(|e| CliError::InvalidInput(e.to_string()))?;
        bytes.extend_from_slice(packet.as_slice());
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sermouse_protocol::Decoder;

    #[test]
    fn test_motion_script_decodes_back() -> Result<(), CliError> {
        for kind in ProtocolKind::ALL {
            let bytes = motion_script(kind, 20)?;
            let mut decoder = Decoder::new(kind);
            let mut events = Vec::new();
            decoder.feed_all(&bytes, |event| events.push(event));

            assert_eq!(events.len(), 20, "{kind}");
            assert_eq!(decoder.error_count(), 0, "{kind}");
            let clicks = events.iter().filter(|event| event.pressed() == Buttons::LEFT).count();
            assert_eq!(clicks, 2, "{kind}");
        }
        Ok(())
    }

    #[test]
    fn test_simulated_unplug_runs_to_completion() -> anyhow::Result<()> {
        execute(SimulatedDevice::Wheel, 16, true, MouseConfig::default(), true)
    }
}
