//! Serial byte transport for pointing devices
//!
//! [`SerialTransport`] is the surface the detection engine and the read pump
//! drive: line configuration, modem control for device power, single-byte
//! asynchronous reads, blocking timed reads for probing, and line-status
//! waits for removal detection.
//!
//! [`mock::MockSerialPort`] implements it in memory for tests and
//! simulation.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod line;
pub mod mock;
pub mod transport;
pub mod verbosity;

pub use error::{TransportError, TransportResult};
pub use line::{DataBits, LineParameters, LineStatus, ModemControl, Parity, RxByte, StopBits};
pub use transport::{ReadCompletion, SerialTransport, WaitCompletion};
pub use verbosity::Verbosity;
