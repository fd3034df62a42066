//! Event sinks
//!
//! A sink is called from completion context and must not block.

use crossbeam::channel::{
    self, Receiver, RecvTimeoutError, Select, Sender, TryRecvError, TrySendError,
};
use parking_lot::Mutex;
use sermouse_protocol::InputEvent;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Receiver of everything the pipeline reports to its host.
pub trait InputSink: Send + Sync {
    /// One completed packet.
    fn deliver(&self, event: &InputEvent);

    /// The device is gone. Called at most once per attach.
    fn notify_removal(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMessage {
    Event(InputEvent),
    Removed,
}

/// Forwards to crossbeam channels. A full bounded channel drops events.
///
/// Removal travels on its own single-slot channel, so it is never lost
/// behind a backlog of events and never waits for room.
#[derive(Debug)]
pub struct ChannelSink {
    events: Sender<InputEvent>,
    removal: Sender<()>,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn unbounded() -> (Self, SinkReceiver) {
        Self::with_events(channel::unbounded())
    }

    pub fn bounded(capacity: usize) -> (Self, SinkReceiver) {
        Self::with_events(channel::bounded(capacity))
    }

    fn with_events((events_tx, events_rx): (Sender<InputEvent>, Receiver<InputEvent>)) -> (Self, SinkReceiver) {
        let (removal_tx, removal_rx) = channel::bounded(1);
        let sink = Self {
            events: events_tx,
            removal: removal_tx,
            dropped: AtomicU64::new(0),
        };
        let receiver = SinkReceiver {
            events: events_rx,
            removal: removal_rx,
        };
        (sink, receiver)
    }

    /// Events lost to a full channel.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl InputSink for ChannelSink {
    fn deliver(&self, event: &InputEvent) {
        match self.events.try_send(*event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn notify_removal(&self) {
        // Full means a removal is already waiting to be read.
        match self.removal.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) | Err(TrySendError::Disconnected(())) => {}
        }
    }
}

/// Host side of a [`ChannelSink`].
///
/// Queued events come out before the removal that followed them.
#[derive(Debug)]
pub struct SinkReceiver {
    events: Receiver<InputEvent>,
    removal: Receiver<()>,
}

impl SinkReceiver {
    pub fn try_recv(&self) -> Result<SinkMessage, TryRecvError> {
        let events = match self.events.try_recv() {
            Ok(event) => return Ok(SinkMessage::Event(event)),
            Err(error) => error,
        };
        match self.removal.try_recv() {
            Ok(()) => Ok(SinkMessage::Removed),
            Err(TryRecvError::Disconnected) if events.is_disconnected() => {
                Err(TryRecvError::Disconnected)
            }
            Err(_) => Err(TryRecvError::Empty),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<SinkMessage, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.try_recv() {
                Ok(message) => return Ok(message),
                Err(TryRecvError::Disconnected) => return Err(RecvTimeoutError::Disconnected),
                Err(TryRecvError::Empty) => {}
            }

            let mut select = Select::new();
            select.recv(&self.events);
            select.recv(&self.removal);
            if select.ready_deadline(deadline).is_err() {
                return Err(RecvTimeoutError::Timeout);
            }
        }
    }

    /// Everything available right now.
    pub fn try_iter(&self) -> impl Iterator<Item = SinkMessage> + '_ {
        std::iter::from_fn(|| self.try_recv().ok())
    }

    /// Events waiting to be read.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// A removal is waiting to be read.
    pub fn removal_pending(&self) -> bool {
        !self.removal.is_empty()
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<InputEvent>>,
    removals: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.events.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn take_events(&self) -> Vec<InputEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn removal_count(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

impl InputSink for RecordingSink {
    fn deliver(&self, event: &InputEvent) {
        self.events.lock().push(*event);
    }

    fn notify_removal(&self) {
        self.removals.fetch_add(1, Ordering::SeqCst);
    }
}
