//! Detection against simulated devices on the scripted port.

use proptest::prelude::*;
use sermouse_detect::sim::{HandshakeMouse, PromptMouse, SimulatedDevice};
use sermouse_detect::{
    DetectError, DetectionConfig, DetectionEngine, ReportRate, scan_handshake,
};
use sermouse_protocol::ProtocolKind;
use sermouse_test_helpers::prelude::*;
use sermouse_transport::mock::MockSerialPort;
use sermouse_transport::{LineParameters, ModemControl, SerialTransport, TransportError};
use std::time::Duration;

fn open_port(port: MockSerialPort) -> MockSerialPort {
    must(port.open());
    port
}

fn handshake_only() -> DetectionConfig {
    must(DetectionConfig::builder().echo_probe(false).build())
}

#[test]
fn test_silent_line_reports_no_device_in_bounded_time() -> TestResult {
    let port = open_port(MockSerialPort::inline());
    let config = DetectionConfig::default();
    let bound = config.worst_case_duration();

    let engine = DetectionEngine::new(&port, config)?;
    assert_eq!(engine.detect()?, None);
    assert!(
        port.elapsed() <= bound,
        "took {:?}, bound {:?}",
        port.elapsed(),
        bound
    );
    Ok(())
}

#[test]
fn test_silent_handshake_owes_no_compensating_delay() -> TestResult {
    let port = open_port(MockSerialPort::inline());
    let engine = DetectionEngine::new(&port, handshake_only())?;
    assert_eq!(engine.detect()?, None);
    // power-off delay plus the first-byte timeout, nothing more
    assert_eq!(port.elapsed(), Duration::from_millis(300));
    Ok(())
}

#[test]
fn test_unmatched_handshake_issues_compensating_delay() -> TestResult {
    let port = open_port(MockSerialPort::inline().with_responder(HandshakeMouse::new(b"xyz".to_vec())));
    let engine = DetectionEngine::new(&port, handshake_only())?;
    assert_eq!(engine.detect()?, None);

    let chars = LineParameters::seven_n_one(1200).char_time() * 3;
    let expected = Duration::from_millis(100) + chars + Duration::from_millis(100 + 200);
    assert_eq!(port.elapsed(), expected);
    Ok(())
}

#[test]
fn test_handshake_devices_identified() -> TestResult {
    for device in [
        SimulatedDevice::Microsoft,
        SimulatedDevice::ThreeButton,
        SimulatedDevice::Wheel,
        SimulatedDevice::Ballpoint,
    ] {
        let port = open_port(MockSerialPort::inline().with_responder(device.responder()));
        let engine = DetectionEngine::new(&port, DetectionConfig::default())?;
        let found = must_some(engine.detect()?, "handshake device must be found");

        assert_eq!(found.variant, device.protocol(), "{device}");
        assert_eq!(found.button_count, device.button_count(), "{device}");
        assert_eq!(found.baud_rate, 1200);
        assert_eq!(port.line_parameters(), LineParameters::seven_n_one(1200));
        // found by the first probe, so nothing was written
        assert!(port.writes().is_empty());
    }
    Ok(())
}

#[test]
fn test_handshake_power_cycles_device() -> TestResult {
    let port = open_port(MockSerialPort::inline().with_responder(HandshakeMouse::microsoft()));
    let engine = DetectionEngine::new(&port, DetectionConfig::default())?;
    assert!(engine.detect()?.is_some());
    assert_eq!(
        port.modem_history(),
        vec![ModemControl::POWER_OFF, ModemControl::POWER_ON]
    );
    assert!(port.flush_count() >= 1);
    Ok(())
}

#[test]
fn test_handshake_skips_power_on_noise() -> TestResult {
    let mouse = HandshakeMouse::three_button().with_preamble(vec![0x00, 0x13, 0x7F]);
    let port = open_port(MockSerialPort::inline().with_responder(mouse));
    let engine = DetectionEngine::new(&port, DetectionConfig::default())?;
    let found = must_some(engine.detect()?, "device behind noise");
    assert_eq!((found.variant, found.button_count), (ProtocolKind::Mp, 3));
    Ok(())
}

#[test]
fn test_handshake_read_is_capped() -> TestResult {
    let mouse = HandshakeMouse::microsoft().with_preamble(vec![0x00; 255]);
    let port = open_port(MockSerialPort::inline().with_responder(mouse));
    let engine = DetectionEngine::new(&port, handshake_only())?;
    assert_eq!(engine.detect()?, None);
    // the identification is left unread behind the cap
    assert_eq!(port.queued_bytes(), 1);
    Ok(())
}

#[test]
fn test_echo_sweep_finds_prompt_device() -> TestResult {
    let mouse = PromptMouse::new(4800, 3);
    let device = mouse.state_handle();
    let port = open_port(MockSerialPort::inline().with_responder(mouse));

    let engine = DetectionEngine::new(&port, DetectionConfig::default())?;
    let found = must_some(engine.detect()?, "prompt device must be found");

    assert_eq!(found.variant, ProtocolKind::Mm);
    assert_eq!(found.button_count, 3);
    // switched back to the default rate before streaming
    assert_eq!(found.baud_rate, 1200);
    assert_eq!(port.line_parameters(), LineParameters::eight_o_one(1200));

    let state = *device.lock();
    assert_eq!(state.baud, 1200);
    assert_eq!(state.report_rate, ReportRate::Continuous);
    assert!(!state.prompt_mode);

    let swept: Vec<u32> = port
        .line_history()
        .iter()
        .filter(|line| *line == &LineParameters::eight_o_one(line.baud))
        .map(|line| line.baud)
        .collect();
    assert_eq!(swept, vec![1200, 2400, 4800, 1200]);

    let written = port.written_bytes();
    assert!(written.ends_with(b"k*nO"), "{written:02x?}");
    Ok(())
}

#[test]
fn test_echo_restores_configured_rate() -> TestResult {
    let mouse = PromptMouse::new(1200, 2);
    let device = mouse.state_handle();
    let port = open_port(MockSerialPort::inline().with_responder(mouse));

    let config = DetectionConfig::builder()
        .default_baud(9600)
        .default_report_rate(ReportRate::Hz100)
        .build()?;
    let engine = DetectionEngine::new(&port, config)?;
    let found = must_some(engine.detect()?, "prompt device must be found");

    assert_eq!(found.baud_rate, 9600);
    assert_eq!(found.button_count, 2);
    assert_eq!(device.lock().baud, 9600);
    assert_eq!(device.lock().report_rate, ReportRate::Hz100);
    Ok(())
}

#[test]
fn test_untrusted_button_count_falls_back() -> TestResult {
    let port = open_port(MockSerialPort::inline().with_responder(PromptMouse::new(1200, 5)));
    let engine = DetectionEngine::new(&port, DetectionConfig::default())?;
    let found = must_some(engine.detect()?, "prompt device must be found");
    assert_eq!(found.button_count, 2);

    let port = open_port(MockSerialPort::inline().with_responder(PromptMouse::new(1200, 3)));
    let config = DetectionConfig::builder()
        .query_button_count(false)
        .default_buttons(3)
        .build()?;
    let engine = DetectionEngine::new(&port, config)?;
    let found = must_some(engine.detect()?, "prompt device must be found");
    assert_eq!(found.button_count, 3);
    assert!(!port.written_bytes().contains(&b'k'));
    Ok(())
}

#[test]
fn test_device_outside_candidates_not_found() -> TestResult {
    let port = open_port(MockSerialPort::inline().with_responder(PromptMouse::new(9600, 2)));
    let config = DetectionConfig::builder()
        .baud_candidates(vec![1200, 2400])
        .build()?;
    let engine = DetectionEngine::new(&port, config)?;
    assert_eq!(engine.detect()?, None);
    Ok(())
}

#[test]
fn test_transport_failure_surfaces() -> TestResult {
    let port = MockSerialPort::inline();
    let engine = DetectionEngine::new(&port, DetectionConfig::default())?;
    assert_eq!(
        engine.detect(),
        Err(DetectError::Transport(TransportError::NotOpen))
    );
    Ok(())
}

#[test]
fn test_invalid_config_rejected() {
    let port = MockSerialPort::inline();
    let config = DetectionConfig {
        echo_timeout_ms: 0,
        ..DetectionConfig::default()
    };
    assert!(matches!(
        DetectionEngine::new(&port, config),
        Err(DetectError::InvalidConfiguration(_))
    ));
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(500))]

    /// A scan matches exactly when an identification character is present.
    #[test]
    fn prop_scan_matches_iff_id_present(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let has_id = bytes.iter().any(|&b| b == b'M' || b == b'B');
        prop_assert_eq!(scan_handshake(&bytes).is_some(), has_id);
    }

    /// Noise ahead of an identification never changes the outcome.
    #[test]
    fn prop_noise_prefix_ignored(
        noise in proptest::collection::vec(any::<u8>().prop_filter("no id", |b| *b != b'M' && *b != b'B'), 0..32),
        id in prop_oneof![Just(b"M".to_vec()), Just(b"M3".to_vec()), Just(b"MZ".to_vec()), Just(b"B".to_vec())],
    ) {
        let mut bytes = noise;
        bytes.extend_from_slice(&id);
        prop_assert_eq!(scan_handshake(&bytes), scan_handshake(&id));
    }

    /// Detection of a silent line never exceeds the configured bound.
    #[test]
    fn prop_silent_detection_bounded(
        first in 1u64..400,
        next in 1u64..200,
        echo in 1u64..100,
        off in 0u64..300,
        on in 0u64..300,
    ) {
        let config = DetectionConfig::builder()
            .handshake_timeouts_ms(first.max(next), next)
            .echo_timeout_ms(echo)
            .power_delays_ms(off, on)
            .build();
        prop_assert!(config.is_ok());
        let Ok(config) = config else { return Ok(()) };
        let bound = config.worst_case_duration();

        let port = MockSerialPort::inline();
        prop_assert!(port.open().is_ok());
        let engine = DetectionEngine::new(&port, config);
        prop_assert!(engine.is_ok());
        let Ok(engine) = engine else { return Ok(()) };

        prop_assert_eq!(engine.detect(), Ok(None));
        prop_assert!(port.elapsed() <= bound);
    }
}

#[test]
fn test_package_metadata_is_set() {
    assert!(env!("CARGO_PKG_DESCRIPTION").contains("baud rate detection"));
}
