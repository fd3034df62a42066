//! Serial mouse acquisition pipeline
//!
//! Drives one attached serial pointing device from detection to removal:
//!
//! - [`SerialMouse`]: host-facing lifecycle (`on_attach`, `enable`,
//!   `disable`, `on_stop`, `on_remove`, `suspend`, `resume`)
//! - read pump: one outstanding single-byte read, decoded byte by byte, with
//!   inline completions flattened into a loop
//! - removal watcher: waits on the asserted modem status lines and reports
//!   a change as removal
//! - [`InputSink`]: where events and the single removal notification go
//!
//! Only two things ever reach the sink: decoded [`InputEvent`]s and at most
//! one removal per attach. Cancellation during a planned stop is never
//! reported.
//!
//! ```rust
//! use std::sync::Arc;
//! use sermouse_detect::sim::HandshakeMouse;
//! use sermouse_pipeline::{MouseConfig, RecordingSink, SerialMouse};
//! use sermouse_transport::mock::MockSerialPort;
//!
//! let port = Arc::new(MockSerialPort::inline().with_responder(HandshakeMouse::microsoft()));
//! let sink = Arc::new(RecordingSink::new());
//! let mut mouse = SerialMouse::new(port.clone(), sink.clone(), MouseConfig::default())?;
//!
//! assert!(mouse.on_attach());
//! port.push_bytes(&[0x60, 0x01, 0x02]);
//! assert_eq!(sink.event_count(), 1);
//!
//! mouse.on_remove()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`InputEvent`]: sermouse_protocol::InputEvent

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod context;
pub mod counters;
pub mod error;
pub mod in_use;
pub mod interlock;
pub mod mouse;
mod pump;
pub mod sink;
mod watcher;

pub use config::{MouseConfig, PipelineConfig, PipelineConfigBuilder};
pub use context::{DeviceContext, RemovalReason};
pub use counters::{CounterSnapshot, PipelineCounters};
pub use error::{PipelineError, PipelineResult};
pub use in_use::{InUseCount, InUseGuard};
pub use interlock::{IssueInterlock, IssueState};
pub use mouse::SerialMouse;
pub use sink::{ChannelSink, InputSink, RecordingSink, SinkMessage, SinkReceiver};
