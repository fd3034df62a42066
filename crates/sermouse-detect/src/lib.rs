//! Protocol detection for serial pointing devices
//!
//! Run once per attach and again on resume, before the read pump starts.
//! [`DetectionEngine::detect`] owns the transport for the whole pass and
//! returns the protocol, button count and baud rate of the attached device,
//! or `None` when nothing answers.
//!
//! ```rust
//! use sermouse_detect::{DetectionConfig, DetectionEngine, sim::HandshakeMouse};
//! use sermouse_protocol::ProtocolKind;
//! use sermouse_transport::{SerialTransport, mock::MockSerialPort};
//!
//! let port = MockSerialPort::inline().with_responder(HandshakeMouse::wheel());
//! port.open()?;
//!
//! let engine = DetectionEngine::new(&port, DetectionConfig::default())?;
//! let found = engine.detect()?.ok_or("no device")?;
//! assert_eq!(found.variant, ProtocolKind::Z);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod sim;

pub use commands::ReportRate;
pub use config::{DetectionConfig, DetectionConfigBuilder};
pub use engine::{DetectionEngine, DetectionResult, scan_handshake};
pub use error::{DetectError, DetectResult};
