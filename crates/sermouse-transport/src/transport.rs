//! The byte transport consumed by detection and the read pump

use std::time::Duration;

use crate::{LineParameters, LineStatus, ModemControl, RxByte, TransportResult};

/// Completion for [`SerialTransport::read_byte_async`].
pub type ReadCompletion = Box<dyn FnOnce(TransportResult<RxByte>) + Send>;

/// Completion for [`SerialTransport::wait_line_event`], carrying the bits
/// observed when the wait ended.
pub type WaitCompletion = Box<dyn FnOnce(TransportResult<LineStatus>) + Send>;

/// A serial port as seen by the acquisition pipeline.
///
/// Asynchronous requests report through their completion exactly once. A
/// completion may run on any thread, and it may also run before the issuing
/// call returns when the port already has data buffered. Callers must not
/// hold locks across an issuing call for that reason.
pub trait SerialTransport: Send + Sync {
    fn open(&self) -> TransportResult<()>;

    /// Closes the port. Outstanding requests complete as cancelled.
    fn close(&self) -> TransportResult<()>;

    fn set_line_parameters(&self, params: LineParameters) -> TransportResult<()>;

    fn set_modem_control(&self, control: ModemControl) -> TransportResult<()>;

    /// Starts a single-byte read.
    fn read_byte_async(&self, completion: ReadCompletion);

    /// Cancels the outstanding read, if any. Idempotent.
    fn cancel_read(&self);

    /// Blocking read used by detection only.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TransportError::Timeout`] when nothing arrives within
    /// `timeout`.
    fn read_byte_timeout(&self, timeout: Duration) -> TransportResult<u8>;

    /// Synchronous write, never used on the steady-state path.
    fn write_bytes(&self, data: &[u8]) -> TransportResult<()>;

    fn flush_input(&self) -> TransportResult<()>;

    /// Waits until any status line in `mask` changes.
    fn wait_line_event(&self, mask: LineStatus, completion: WaitCompletion);

    /// Cancels the outstanding line-event wait, if any. Idempotent.
    fn cancel_wait(&self);

    fn line_status(&self) -> TransportResult<LineStatus>;

    fn delay(&self, duration: Duration);
}
