//! Scripted in-memory serial port
//!
//! [`MockSerialPort`] runs on a virtual clock: timed reads and delays advance
//! it instead of sleeping, so detection sequences finish instantly in tests
//! while still reporting how long they would have taken.
//!
//! In [`CompletionMode::Inline`] a read completes inside `read_byte_async`
//! whenever a byte is already queued, which is the case that makes naive
//! read loops recurse. In [`CompletionMode::Deferred`] every read stays
//! pending until the test calls [`MockSerialPort::deliver_next`], possibly
//! from another thread.
//!
//! Bytes a [`DeviceResponder`] sends back are still on the wire until the
//! next read, write or delay, so a flush issued right after a command does
//! not discard the reply to that command.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::trace;

use sermouse_protocol::LineState;

use crate::{
    LineParameters, LineStatus, ModemControl, ReadCompletion, RxByte, SerialTransport, TransportError,
    TransportResult, WaitCompletion,
};

/// Simulated device behind the port.
pub trait DeviceResponder: Send {
    /// Bytes the device emits once DTR and RTS power it.
    fn on_power_up(&mut self, line: &LineParameters) -> Vec<u8>;

    /// Bytes the device answers a host write with.
    fn on_write(&mut self, line: &LineParameters, data: &[u8]) -> Vec<u8>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    #[default]
    Inline,
    Deferred,
}

struct PortState {
    open: bool,
    disconnected: bool,
    line: LineParameters,
    modem: ModemControl,
    status: LineStatus,
    rx: VecDeque<RxByte>,
    in_flight: Vec<u8>,
    pending_read: Option<ReadCompletion>,
    pending_wait: Option<(LineStatus, WaitCompletion)>,
    writes: Vec<Vec<u8>>,
    line_history: Vec<LineParameters>,
    modem_history: Vec<ModemControl>,
    clock: Duration,
    flushes: usize,
    read_failure: Option<TransportError>,
    wait_failure: Option<TransportError>,
    spurious_wakeups: usize,
    overlapping_requests: usize,
    responder: Option<Box<dyn DeviceResponder>>,
}

impl Default for PortState {
    fn default() -> Self {
        Self {
            open: false,
            disconnected: false,
            line: LineParameters::seven_n_one(1200),
            modem: ModemControl::POWER_OFF,
            status: LineStatus::empty(),
            rx: VecDeque::new(),
            in_flight: Vec::new(),
            pending_read: None,
            pending_wait: None,
            writes: Vec::new(),
            line_history: Vec::new(),
            modem_history: Vec::new(),
            clock: Duration::ZERO,
            flushes: 0,
            read_failure: None,
            wait_failure: None,
            spurious_wakeups: 0,
            overlapping_requests: 0,
            responder: None,
        }
    }
}

impl PortState {
    fn check_open(&self) -> TransportResult<()> {
        if self.disconnected {
            return Err(TransportError::Disconnected);
        }
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        Ok(())
    }

    fn enqueue(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied().map(RxByte::clean));
    }

    /// Moves device replies from the wire into the receive buffer.
    fn land(&mut self) {
        let landed = std::mem::take(&mut self.in_flight);
        self.enqueue(&landed);
    }

    /// Pairs a parked read with a queued byte when inline delivery applies.
    fn ready_read(&mut self, mode: CompletionMode) -> Option<(ReadCompletion, RxByte)> {
        if mode != CompletionMode::Inline || self.rx.is_empty() {
            return None;
        }
        let completion = self.pending_read.take()?;
        let byte = self.rx.pop_front()?;
        Some((completion, byte))
    }
}

pub struct MockSerialPort {
    mode: CompletionMode,
    state: Mutex<PortState>,
    depth: AtomicUsize,
    max_depth: AtomicUsize,
    reads_issued: AtomicUsize,
    waits_issued: AtomicUsize,
}

impl MockSerialPort {
    pub fn new(mode: CompletionMode) -> Self {
        Self {
            mode,
            state: Mutex::new(PortState::default()),
            depth: AtomicUsize::new(0),
            max_depth: AtomicUsize::new(0),
            reads_issued: AtomicUsize::new(0),
            waits_issued: AtomicUsize::new(0),
        }
    }

    pub fn inline() -> Self {
        Self::new(CompletionMode::Inline)
    }

    pub fn deferred() -> Self {
        Self::new(CompletionMode::Deferred)
    }

    #[must_use]
    pub fn with_responder(self, responder: impl DeviceResponder + 'static) -> Self {
        self.state.lock().responder = Some(Box::new(responder));
        self
    }

    #[must_use]
    pub fn with_line_status(self, status: LineStatus) -> Self {
        self.state.lock().status = status;
        self
    }

    pub fn mode(&self) -> CompletionMode {
        self.mode
    }

    /// Queues clean bytes as if the device had sent them.
    pub fn push_bytes(&self, bytes: &[u8]) {
        let ready = {
            let mut state = self.state.lock();
            state.enqueue(bytes);
            state.ready_read(self.mode)
        };
        if let Some((completion, byte)) = ready {
            completion(Ok(byte));
        }
    }

    /// Queues one byte received with line errors.
    pub fn push_corrupt(&self, byte: u8, line: LineState) {
        let ready = {
            let mut state = self.state.lock();
            state.rx.push_back(RxByte::with_line(byte, line));
            state.ready_read(self.mode)
        };
        if let Some((completion, byte)) = ready {
            completion(Ok(byte));
        }
    }

    /// Completes the parked read with the next queued byte.
    ///
    /// Returns `false` when no read is parked or nothing is queued.
    pub fn deliver_next(&self) -> bool {
        let ready = {
            let mut state = self.state.lock();
            if state.pending_read.is_none() || state.rx.is_empty() {
                None
            } else {
                let completion = state.pending_read.take();
                let byte = state.rx.pop_front();
                completion.zip(byte)
            }
        };
        match ready {
            Some((completion, byte)) => {
                completion(Ok(byte));
                true
            }
            None => false,
        }
    }

    /// Fails the parked read with `error`, or the next read if none is parked.
    pub fn inject_read_failure(&self, error: TransportError) {
        let parked = {
            let mut state = self.state.lock();
            match state.pending_read.take() {
                Some(completion) => Some(completion),
                None => {
                    state.read_failure = Some(error.clone());
                    None
                }
            }
        };
        if let Some(completion) = parked {
            completion(Err(error));
        }
    }

    /// Fails the parked wait with `error`, or the next wait if none is parked.
    pub fn inject_wait_failure(&self, error: TransportError) {
        let parked = {
            let mut state = self.state.lock();
            match state.pending_wait.take() {
                Some((_, completion)) => Some(completion),
                None => {
                    state.wait_failure = Some(error.clone());
                    None
                }
            }
        };
        if let Some(completion) = parked {
            completion(Err(error));
        }
    }

    /// Changes the input status lines, completing a parked wait whose mask
    /// covers a changed bit.
    pub fn set_line_status(&self, status: LineStatus) {
        let fired = {
            let mut state = self.state.lock();
            let changed = state.status ^ status;
            state.status = status;
            let covered = state
                .pending_wait
                .as_ref()
                .is_some_and(|(mask, _)| changed.intersects(*mask));
            if covered {
                state.pending_wait.take().map(|(_, completion)| completion)
            } else {
                None
            }
        };
        if let Some(completion) = fired {
            completion(Ok(status));
        }
    }

    /// Wakes the parked wait without any status change.
    pub fn fire_spurious_line_event(&self) -> bool {
        let fired = {
            let mut state = self.state.lock();
            let status = state.status;
            state.pending_wait.take().map(|(_, completion)| (completion, status))
        };
        match fired {
            Some((completion, status)) => {
                completion(Ok(status));
                true
            }
            None => false,
        }
    }

    /// The next `count` waits complete immediately with unchanged status.
    pub fn queue_spurious_wakeups(&self, count: usize) {
        let mut state = self.state.lock();
        state.spurious_wakeups = state.spurious_wakeups.saturating_add(count);
    }

    /// Pulls the plug: status lines drop and the parked read fails.
    pub fn disconnect(&self) {
        let (read, wait) = {
            let mut state = self.state.lock();
            state.disconnected = true;
            let changed = state.status;
            state.status = LineStatus::empty();
            let wait = match state.pending_wait.take() {
                Some((mask, completion)) if changed.intersects(mask) => Some(completion),
                Some(parked) => {
                    state.pending_wait = Some(parked);
                    None
                }
                None => None,
            };
            (state.pending_read.take(), wait)
        };
        if let Some(completion) = read {
            completion(Err(TransportError::Disconnected));
        }
        if let Some(completion) = wait {
            completion(Ok(LineStatus::empty()));
        }
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().writes.concat()
    }

    pub fn line_history(&self) -> Vec<LineParameters> {
        self.state.lock().line_history.clone()
    }

    pub fn line_parameters(&self) -> LineParameters {
        self.state.lock().line
    }

    pub fn modem_history(&self) -> Vec<ModemControl> {
        self.state.lock().modem_history.clone()
    }

    /// Virtual time consumed by timed reads, writes and delays.
    pub fn elapsed(&self) -> Duration {
        self.state.lock().clock
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }

    pub fn queued_bytes(&self) -> usize {
        let state = self.state.lock();
        state.rx.len().saturating_add(state.in_flight.len())
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn has_pending_read(&self) -> bool {
        self.state.lock().pending_read.is_some()
    }

    pub fn has_pending_wait(&self) -> bool {
        self.state.lock().pending_wait.is_some()
    }

    /// Requests issued while another of the same kind was still parked.
    pub fn overlapping_requests(&self) -> usize {
        self.state.lock().overlapping_requests
    }

    /// Deepest nesting of `read_byte_async` calls seen so far.
    pub fn max_read_depth(&self) -> usize {
        self.max_depth.load(Ordering::SeqCst)
    }

    pub fn reads_issued(&self) -> usize {
        self.reads_issued.load(Ordering::SeqCst)
    }

    pub fn waits_issued(&self) -> usize {
        self.waits_issued.load(Ordering::SeqCst)
    }
}

impl<T: DeviceResponder + ?Sized> DeviceResponder for Box<T> {
    fn on_power_up(&mut self, line: &LineParameters) -> Vec<u8> {
        (**self).on_power_up(line)
    }

    fn on_write(&mut self, line: &LineParameters, data: &[u8]) -> Vec<u8> {
        (**self).on_write(line, data)
    }
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::inline()
    }
}

impl SerialTransport for MockSerialPort {
    fn open(&self) -> TransportResult<()> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(TransportError::Disconnected);
        }
        state.open = true;
        Ok(())
    }

    fn close(&self) -> TransportResult<()> {
        let (read, wait) = {
            let mut state = self.state.lock();
            state.open = false;
            (state.pending_read.take(), state.pending_wait.take())
        };
        if let Some(completion) = read {
            completion(Err(TransportError::Cancelled));
        }
        if let Some((_, completion)) = wait {
            completion(Err(TransportError::Cancelled));
        }
        Ok(())
    }

    fn set_line_parameters(&self, params: LineParameters) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.check_open()?;
        trace!(line = %params, "mock line parameters");
        state.line = params;
        state.line_history.push(params);
        Ok(())
    }

    fn set_modem_control(&self, control: ModemControl) -> TransportResult<()> {
        let ready = {
            let mut state = self.state.lock();
            state.check_open()?;
            state.land();
            let was_powered = state.modem.powers_device();
            state.modem = control;
            state.modem_history.push(control);
            if !was_powered && control.powers_device() {
                let line = state.line;
                let reply = state
                    .responder
                    .as_mut()
                    .map(|device| device.on_power_up(&line))
                    .unwrap_or_default();
                trace!(bytes = reply.len(), "mock power up");
                state.in_flight.extend_from_slice(&reply);
            }
            state.ready_read(self.mode)
        };
        if let Some((completion, byte)) = ready {
            completion(Ok(byte));
        }
        Ok(())
    }

    fn read_byte_async(&self, completion: ReadCompletion) {
        self.reads_issued.fetch_add(1, Ordering::SeqCst);
        let depth = self.depth.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.max_depth.fetch_max(depth, Ordering::SeqCst);

        let mut completion = Some(completion);
        let result = {
            let mut state = self.state.lock();
            state.land();
            if let Err(error) = state.check_open() {
                Some(Err(error))
            } else if let Some(error) = state.read_failure.take() {
                Some(Err(error))
            } else if self.mode == CompletionMode::Inline && !state.rx.is_empty() {
                state.rx.pop_front().map(Ok)
            } else {
                if state.pending_read.is_some() {
                    state.overlapping_requests = state.overlapping_requests.saturating_add(1);
                }
                state.pending_read = completion.take();
                None
            }
        };
        if let (Some(result), Some(completion)) = (result, completion) {
            completion(result);
        }

        self.depth.fetch_sub(1, Ordering::SeqCst);
    }

    fn cancel_read(&self) {
        let parked = self.state.lock().pending_read.take();
        if let Some(completion) = parked {
            completion(Err(TransportError::Cancelled));
        }
    }

    fn read_byte_timeout(&self, timeout: Duration) -> TransportResult<u8> {
        let mut state = self.state.lock();
        state.check_open()?;
        state.land();
        match state.rx.pop_front() {
            Some(rx) => {
                let char_time = state.line.char_time();
                state.clock = state.clock.saturating_add(char_time);
                Ok(rx.byte)
            }
            None => {
                state.clock = state.clock.saturating_add(timeout);
                Err(TransportError::Timeout)
            }
        }
    }

    fn write_bytes(&self, data: &[u8]) -> TransportResult<()> {
        let ready = {
            let mut state = self.state.lock();
            state.check_open()?;
            state.land();
            state.writes.push(data.to_vec());
            let line = state.line;
            let wire = line.char_time().saturating_mul(u32::try_from(data.len()).unwrap_or(u32::MAX));
            state.clock = state.clock.saturating_add(wire);
            let reply = state
                .responder
                .as_mut()
                .map(|device| device.on_write(&line, data))
                .unwrap_or_default();
            trace!(written = data.len(), reply = reply.len(), "mock write");
            state.in_flight.extend_from_slice(&reply);
            state.ready_read(self.mode)
        };
        if let Some((completion, byte)) = ready {
            completion(Ok(byte));
        }
        Ok(())
    }

    fn flush_input(&self) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.check_open()?;
        state.rx.clear();
        state.flushes = state.flushes.saturating_add(1);
        Ok(())
    }

    fn wait_line_event(&self, mask: LineStatus, completion: WaitCompletion) {
        self.waits_issued.fetch_add(1, Ordering::SeqCst);

        let mut completion = Some(completion);
        let result = {
            let mut state = self.state.lock();
            if let Err(error) = state.check_open() {
                Some(Err(error))
            } else if let Some(error) = state.wait_failure.take() {
                Some(Err(error))
            } else if state.spurious_wakeups > 0 {
                state.spurious_wakeups = state.spurious_wakeups.saturating_sub(1);
                Some(Ok(state.status))
            } else {
                if state.pending_wait.is_some() {
                    state.overlapping_requests = state.overlapping_requests.saturating_add(1);
                }
                state.pending_wait = completion.take().map(|completion| (mask, completion));
                None
            }
        };
        if let (Some(result), Some(completion)) = (result, completion) {
            completion(result);
        }
    }

    fn cancel_wait(&self) {
        let parked = self.state.lock().pending_wait.take();
        if let Some((_, completion)) = parked {
            completion(Err(TransportError::Cancelled));
        }
    }

    fn line_status(&self) -> TransportResult<LineStatus> {
        let state = self.state.lock();
        state.check_open()?;
        Ok(state.status)
    }

    fn delay(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.land();
        state.clock = state.clock.saturating_add(duration);
    }
}
